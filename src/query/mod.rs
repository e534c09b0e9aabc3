//! Live radius queries.
//!
//! A search runs in four steps:
//!
//! 1. [`planner`] picks a code length for the radius and lists the center
//!    cell plus its neighbors
//! 2. [`merge`] opens one live range subscription per cell and recombines
//!    their latest snapshots whenever any of them changes
//! 3. [`rank`] deduplicates the merged documents, keeps those within the
//!    buffered radius and sorts them by great-circle distance
//! 4. [`GeoQuery`] emits the ranked hits as a `Stream` until it is cancelled
//!    or dropped

pub mod merge;
pub mod planner;
pub mod rank;

use crate::compute::geojson::to_geojson;
use crate::config::GeoQueryOptions;
use crate::error::{GeoError, Result};
use crate::point::GeoPoint;
use crate::storage::LiveStore;
use futures::stream::FusedStream;
use futures::{Stream, StreamExt};
use geojson::FeatureCollection;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Instant;

pub use merge::{CancelHandle, FanOutMerge};
pub use planner::{CoveringPlan, plan};
pub use rank::{Hit, HitMetadata, RadiusFilter};

/// A live, distance-ordered radius search.
///
/// Each item is the complete current result, nearest first. The first item
/// arrives once every covering cell has reported. Dropping the query, or
/// cancelling it through a [`CancelHandle`], releases every cell subscription.
pub struct GeoQuery {
    merge: FanOutMerge,
    filter: RadiusFilter,
    covering: CoveringPlan,
    center: GeoPoint,
    radius_km: f64,
    field: String,
    options: GeoQueryOptions,
    started: Instant,
}

impl GeoQuery {
    /// Plans the covering set and subscribes one live range query per cell.
    ///
    /// Invalid options, radius or center fail here, before any subscription
    /// is opened.
    pub fn open<S: LiveStore + ?Sized>(
        store: &S,
        collection: &str,
        center: &GeoPoint,
        radius_km: f64,
        field: &str,
        options: GeoQueryOptions,
    ) -> Result<Self> {
        options.validate().map_err(GeoError::InvalidOptions)?;
        let started = Instant::now();

        let covering = planner::plan(center, radius_km)?;
        let merge = FanOutMerge::open(store, &covering.range_queries(collection, field))?;

        Ok(Self {
            merge,
            filter: RadiusFilter::new(center, radius_km, options.buffer_factor),
            covering,
            center: center.clone(),
            radius_km,
            field: field.to_string(),
            options,
            started,
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.merge.cancel_handle()
    }

    /// Releases all subscriptions now. Idempotent.
    pub fn cancel(&self) {
        self.merge.cancel_handle().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.merge.is_cancelled()
    }

    pub fn covering(&self) -> &CoveringPlan {
        &self.covering
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Cell subscriptions still open.
    pub fn live_subscriptions(&self) -> usize {
        self.merge.live_count()
    }

    /// Maps every emission to a GeoJSON FeatureCollection.
    pub fn geojson(
        self,
        include_props: bool,
    ) -> impl Stream<Item = Result<FeatureCollection>> + Unpin + Send {
        let field = self.field.clone();
        self.map(move |hits| hits.map(|hits| to_geojson(&hits, &field, include_props)))
    }

    fn log_emission(&self, raw: usize, kept: usize) {
        let elapsed = self.started.elapsed().as_millis();
        if self.options.log {
            log::info!(
                "GeoQuery center ({}, {}), radius {} km",
                self.center.latitude(),
                self.center.longitude(),
                self.radius_km
            );
            log::info!("GeoQuery hits: {}", raw);
            log::info!("GeoQuery elapsed time: {}ms", elapsed);
            log::info!("GeoQuery within radius: {}", kept);
        } else {
            log::debug!(
                "radius query emitted {} of {} hits after {}ms",
                kept,
                raw,
                elapsed
            );
        }
    }
}

impl Stream for GeoQuery {
    type Item = Result<Vec<Hit>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match ready!(this.merge.poll_next_unpin(cx)) {
            None => Poll::Ready(None),
            Some(Err(e)) => Poll::Ready(Some(Err(e))),
            Some(Ok(docs)) => {
                let raw = docs.len();
                let hits = this.filter.rank(&this.field, docs);
                // A cancel that landed while ranking wins over delivery
                if this.merge.is_cancelled() {
                    return Poll::Ready(None);
                }
                this.log_emission(raw, hits.len());
                Poll::Ready(Some(Ok(hits)))
            }
        }
    }
}

impl FusedStream for GeoQuery {
    fn is_terminated(&self) -> bool {
        self.merge.is_terminated()
    }
}

impl Drop for GeoQuery {
    fn drop(&mut self) {
        if self.options.log {
            log::info!("GeoQuery complete");
        }
    }
}

impl std::fmt::Debug for GeoQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoQuery")
            .field("center", &self.center)
            .field("radius_km", &self.radius_km)
            .field("field", &self.field)
            .field("cells", &self.covering.cells)
            .finish()
    }
}

/// Resolves to the first value of a live stream, then drops the stream,
/// which releases its subscriptions.
///
/// ```ignore
/// let hits = geostream::get(places.within(&center, 5.0, "point", Default::default())?).await?;
/// ```
pub async fn get<T, S>(mut stream: S) -> Result<T>
where
    S: Stream<Item = Result<T>> + Unpin,
{
    match stream.next().await {
        Some(item) => item,
        None => Err(GeoError::SessionClosed),
    }
}
