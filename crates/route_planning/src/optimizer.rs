use std::sync::Arc;

use chrono::Utc;
use futures::{stream, FutureExt, StreamExt};
use model::location::Location;
use model::matrix::DistanceMatrix;
use model::plan::{DroppedSupplier, PlannedSupplier, ProjectLocation, RoutePlan};
use model::route::{Route, Stop};
use model::supplier::SelectedSupplier;

use crate::directions::google_maps_url;
use crate::directory::SupplierDirectory;
use crate::geocoder::Geocoder;
use crate::haversine::DEFAULT_SPEED_KMH;
use crate::matrix::MatrixBuilder;
use crate::sequencer::{sequence, Sequence, SequencerOptions};
use crate::{round2, PlanningError, PlanningResult, ValidationError};

#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    pub sequencer: SequencerOptions,
    /// Baht per kilometer driven.
    pub fuel_cost_per_km: f64,
    /// Used for the whole-hour driving estimate.
    pub average_speed_kmh: f64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            sequencer: SequencerOptions::default(),
            fuel_cost_per_km: 0.75,
            average_speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

/// Plans the pickup trip from a project location to the selected suppliers.
#[derive(Clone)]
pub struct RouteOptimizer {
    geocoder: Geocoder,
    matrix_builder: MatrixBuilder,
    directory: Option<Arc<dyn SupplierDirectory>>,
    options: OptimizerOptions,
}

impl RouteOptimizer {
    pub fn new(
        geocoder: Geocoder,
        matrix_builder: MatrixBuilder,
        directory: Option<Arc<dyn SupplierDirectory>>,
        options: OptimizerOptions,
    ) -> Self {
        Self {
            geocoder,
            matrix_builder,
            directory,
            options,
        }
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    pub async fn optimize(
        &self,
        project_location: &str,
        selected: &[SelectedSupplier],
    ) -> PlanningResult<RoutePlan> {
        let project_location = project_location.trim();
        if project_location.is_empty() {
            return Err(ValidationError::MissingProjectLocation.into());
        }
        if selected.is_empty() {
            return Err(ValidationError::EmptyStopList.into());
        }
        log::info!(
            "Optimizing route from '{project_location}' to {} supplier(s)",
            selected.len()
        );

        let origin = self
            .geocoder
            .resolve(Location::from_address(project_location))
            .await
            .inspect_err(|e| log::error!("[origin] Could not locate '{project_location}': {e}"))?;

        let pending = selected
            .iter()
            .map(|supplier| {
                async move { (supplier, self.resolve_supplier(supplier).await) }.boxed()
            })
            .collect::<Vec<_>>();
        let outcomes = stream::iter(pending)
            .buffered(self.geocoder.options().max_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut resolved = Vec::new();
        let mut failed = Vec::new();
        for (supplier, outcome) in outcomes {
            match outcome {
                Ok(location) => resolved.push((supplier, location)),
                Err(e) => {
                    log::warn!(
                        "[suppliers] Dropping supplier '{}' ({:?}): {e}",
                        supplier.display_name(),
                        supplier.id
                    );
                    failed.push(DroppedSupplier {
                        id: supplier.id.clone(),
                        name: supplier.display_name(),
                        location: supplier.address().map(str::to_owned),
                        error: e.user_message(),
                    });
                }
            }
        }
        if resolved.is_empty() {
            log::error!("[suppliers] None of the {} supplier(s) could be located", failed.len());
            return Err(PlanningError::NoResolvableSuppliers { failed });
        }

        let locations = std::iter::once(origin.clone())
            .chain(resolved.iter().map(|(_, location)| location.clone()))
            .collect::<Vec<_>>();
        let matrix = self.matrix_builder.build_matrix(&locations).await?;
        let sequence = sequence(&matrix, &self.options.sequencer)?;

        let route = build_route(
            &sequence,
            &matrix,
            project_location,
            &locations,
            &resolved,
            self.options.sequencer.return_to_origin,
        );
        let suppliers = sequence
            .order
            .iter()
            .skip(1)
            .map(|&index| {
                let (supplier, location) = &resolved[index - 1];
                PlannedSupplier {
                    id: supplier.id.clone(),
                    name: supplier.display_name(),
                    location: location.clone(),
                    items: supplier.items.clone(),
                    total_value: supplier.total_value.unwrap_or_default(),
                }
            })
            .collect();

        let total_distance_km = round2(route.total_distance_km());
        let estimated_hours = (total_distance_km / self.options.average_speed_kmh).ceil() as u32;
        let fuel_cost = round2(total_distance_km * self.options.fuel_cost_per_km);
        let reasoning = reasoning(&sequence, failed.len());

        log::info!(
            "Planned {} stop(s), {total_distance_km} km, {} unknown leg(s), {} supplier(s) dropped",
            route.stops.len(),
            route.unknown_legs,
            failed.len()
        );

        Ok(RoutePlan {
            map_url: google_maps_url(&route),
            route,
            project_location: ProjectLocation {
                address: project_location.to_owned(),
                location: origin,
            },
            suppliers,
            failed_suppliers: failed,
            total_distance_km,
            estimated_hours,
            fuel_cost,
            reasoning,
        })
    }

    /// Coordinates from the request first, then the address text, then the
    /// supplier record.
    async fn resolve_supplier(&self, supplier: &SelectedSupplier) -> PlanningResult<Location> {
        let location = supplier.initial_location();
        if location.resolved() || location.raw_address.is_some() {
            return self.geocoder.resolve(location).await;
        }

        let (Some(id), Some(directory)) = (&supplier.id, &self.directory) else {
            return Err(ValidationError::EmptyAddress.into());
        };
        let record = directory
            .supplier(id)
            .await
            .map_err(|e| PlanningError::Internal(format!("supplier lookup failed: {e}")))?
            .ok_or(ValidationError::EmptyAddress)?;
        log::debug!("[suppliers] Using stored location of supplier {id}");

        let location = match (record.coordinates(), record.location.as_deref()) {
            (Some(coordinates), address) => Location {
                raw_address: address.map(str::to_owned),
                ..Location::from_coordinates(coordinates)
            },
            (None, Some(address)) if !address.trim().is_empty() => Location::from_address(address),
            _ => return Err(ValidationError::EmptyAddress.into()),
        };
        self.geocoder.resolve(location).await
    }
}

fn build_route(
    sequence: &Sequence,
    matrix: &DistanceMatrix,
    project_location: &str,
    locations: &[Location],
    resolved: &[(&SelectedSupplier, Location)],
    return_to_origin: bool,
) -> Route {
    let known = |from: usize, to: usize| matrix.is_known(from, to);

    let stops = sequence
        .order
        .iter()
        .enumerate()
        .map(|(position, &index)| {
            let previous = position.checked_sub(1).map(|p| sequence.order[p]);
            let leg = previous.filter(|&from| known(from, index));
            let supplier = index.checked_sub(1).map(|i| resolved[i].0);
            Stop {
                sequence_index: position,
                supplier_id: supplier.and_then(|s| s.id.clone()),
                name: supplier
                    .map(SelectedSupplier::display_name)
                    .unwrap_or_else(|| project_location.to_owned()),
                location: locations[index].clone(),
                distance_from_previous: leg.map(|from| matrix.distance(from, index)),
                duration_from_previous: leg.map(|from| matrix.duration(from, index)),
            }
        })
        .collect();

    let closing = sequence
        .order
        .last()
        .copied()
        .filter(|&last| return_to_origin && last != 0 && known(last, 0));

    Route {
        stops,
        total_distance_meters: sequence.total_distance_meters,
        total_duration_seconds: sequence.total_duration_seconds,
        unknown_legs: sequence.unknown_legs,
        optimal: sequence.optimal,
        returns_to_origin: return_to_origin && sequence.order.len() > 1,
        return_distance_meters: closing.map(|last| matrix.distance(last, 0)),
        return_duration_seconds: closing.map(|last| matrix.duration(last, 0)),
        computed_at: Utc::now(),
    }
}

fn reasoning(sequence: &Sequence, dropped: usize) -> String {
    let mut text = if sequence.optimal {
        "เส้นทางนี้เป็นลำดับที่สั้นที่สุดสำหรับจำนวนจุดแวะนี้".to_owned()
    } else {
        "จัดลำดับโดยไปยังจุดที่ใกล้ที่สุดก่อน แล้วปรับปรุงด้วยวิธี 2-opt เพื่อลดระยะทางรวม".to_owned()
    };
    if sequence.unknown_legs > 0 {
        text.push_str(&format!(
            " มี {} ช่วงที่ไม่สามารถคำนวณระยะทางได้",
            sequence.unknown_legs
        ));
    }
    if dropped > 0 {
        text.push_str(&format!(" ไม่สามารถระบุตำแหน่งร้านค้าได้ {dropped} ร้าน"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AddressCache;
    use crate::geocoder::GeocoderOptions;
    use crate::haversine::HaversineMatrixProvider;
    use crate::matrix::MatrixOptions;
    use crate::testing::{offset, InMemorySupplierDirectory, StaticGeocodingProvider};
    use crate::GeocodingError;
    use model::location::Coordinates;
    use model::supplier::Supplier;
    use utility::id::Id;

    const PROJECT: Coordinates = Coordinates {
        latitude: 13.7563,
        longitude: 100.5018,
    };
    const PROJECT_ADDRESS: &str = "หมู่บ้านสวนหลวง กรุงเทพฯ";

    fn provider() -> StaticGeocodingProvider {
        StaticGeocodingProvider::new()
            .with_address(PROJECT_ADDRESS, PROJECT)
            .with_address("สวนเหนือ", offset(PROJECT, 5_000.0, 0.0))
            .with_address("สวนใต้", offset(PROJECT, -3_000.0, 0.0))
            .with_address("สวนตะวันออก", offset(PROJECT, 0.0, 8_000.0))
            .with_address("สวนตะวันตก", offset(PROJECT, 1_000.0, -12_000.0))
    }

    fn optimizer_with(
        provider: Arc<StaticGeocodingProvider>,
        directory: Option<Arc<InMemorySupplierDirectory>>,
        options: OptimizerOptions,
    ) -> RouteOptimizer {
        RouteOptimizer::new(
            Geocoder::new(
                provider,
                Arc::new(AddressCache::default()),
                GeocoderOptions::default(),
            ),
            MatrixBuilder::new(
                Arc::new(HaversineMatrixProvider::default()),
                MatrixOptions::default(),
            ),
            directory.map(|directory| directory as Arc<dyn SupplierDirectory>),
            options,
        )
    }

    fn optimizer(provider: Arc<StaticGeocodingProvider>) -> RouteOptimizer {
        optimizer_with(provider, None, OptimizerOptions::default())
    }

    fn supplier(name: &str, location: &str) -> SelectedSupplier {
        SelectedSupplier {
            name: Some(name.to_owned()),
            location: Some(location.to_owned()),
            ..Default::default()
        }
    }

    fn names(plan: &RoutePlan) -> Vec<&str> {
        plan.suppliers.iter().map(|s| s.name.as_str()).collect()
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn optimize_future_can_cross_threads() {
        let optimizer = optimizer(Arc::new(provider()));
        let suppliers = vec![supplier("A", "สวนเหนือ")];
        let future = optimizer.optimize(PROJECT_ADDRESS, &suppliers);
        assert_send(&future);
    }

    #[tokio::test(start_paused = true)]
    async fn optimizes_on_a_spawned_task() {
        let optimizer = optimizer(Arc::new(provider()));
        let plan = tokio::spawn(async move {
            let suppliers = vec![supplier("A", "สวนเหนือ"), supplier("B", "สวนใต้")];
            optimizer.optimize(PROJECT_ADDRESS, &suppliers).await
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(names(&plan), vec!["B", "A"]);
    }

    #[tokio::test]
    async fn empty_supplier_list_never_calls_providers() {
        let provider = Arc::new(provider());
        let result = optimizer(provider.clone()).optimize(PROJECT_ADDRESS, &[]).await;
        assert_eq!(result, Err(ValidationError::EmptyStopList.into()));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn blank_project_location_is_rejected() {
        let provider = Arc::new(provider());
        let result = optimizer(provider.clone())
            .optimize("  ", &[supplier("A", "สวนเหนือ")])
            .await;
        assert_eq!(result, Err(ValidationError::MissingProjectLocation.into()));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn visits_the_closer_supplier_first() {
        let plan = optimizer(Arc::new(provider()))
            .optimize(
                PROJECT_ADDRESS,
                &[supplier("A", "สวนเหนือ"), supplier("B", "สวนใต้")],
            )
            .await
            .unwrap();

        assert_eq!(names(&plan), vec!["B", "A"]);
        assert_eq!(plan.route.stops.len(), 3);
        assert_eq!(plan.route.stops[0].name, PROJECT_ADDRESS);
        assert!(plan.route.stops[0].is_origin());
        assert!((plan.total_distance_km - 11.0).abs() < 0.01);
        assert_eq!(plan.estimated_hours, 1);
        assert!((plan.fuel_cost - 8.25).abs() < 0.01);
        assert!(plan.route.optimal);
        assert!(plan.failed_suppliers.is_empty());
        assert!(plan.map_url.as_deref().unwrap().contains("&waypoints="));
    }

    #[tokio::test(start_paused = true)]
    async fn single_supplier() {
        let plan = optimizer(Arc::new(provider()))
            .optimize(PROJECT_ADDRESS, &[supplier("A", "สวนเหนือ")])
            .await
            .unwrap();
        assert_eq!(plan.route.stops.len(), 2);
        assert!((plan.route.total_distance_meters - 5_000.0).abs() < 1.0);
        assert!(plan.route.optimal);
    }

    #[tokio::test(start_paused = true)]
    async fn input_order_does_not_matter() {
        let suppliers = vec![
            supplier("A", "สวนเหนือ"),
            supplier("B", "สวนใต้"),
            supplier("C", "สวนตะวันออก"),
            supplier("D", "สวนตะวันตก"),
        ];
        let optimizer = optimizer(Arc::new(provider()));
        let forward = optimizer.optimize(PROJECT_ADDRESS, &suppliers).await.unwrap();

        let mut reversed = suppliers.clone();
        reversed.reverse();
        let backward = optimizer.optimize(PROJECT_ADDRESS, &reversed).await.unwrap();

        assert_eq!(names(&forward), names(&backward));
        assert_eq!(forward.total_distance_km, backward.total_distance_km);
    }

    #[tokio::test(start_paused = true)]
    async fn totals_are_the_sum_of_the_legs() {
        let suppliers = vec![
            supplier("A", "สวนเหนือ"),
            supplier("B", "สวนใต้"),
            supplier("C", "สวนตะวันออก"),
        ];
        let plan = optimizer(Arc::new(provider()))
            .optimize(PROJECT_ADDRESS, &suppliers)
            .await
            .unwrap();

        let legs: f64 = plan
            .route
            .supplier_stops()
            .iter()
            .filter_map(|stop| stop.distance_from_previous)
            .sum();
        assert!((legs - plan.route.total_distance_meters).abs() < 1e-6);
        assert_eq!(plan.route.unknown_legs, 0);
        assert_eq!(plan.suppliers.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unlocatable_suppliers_are_reported() {
        let plan = optimizer(Arc::new(provider()))
            .optimize(
                PROJECT_ADDRESS,
                &[
                    supplier("A", "สวนเหนือ"),
                    supplier("X", "ที่ไหนก็ไม่รู้"),
                    SelectedSupplier {
                        name: Some("Y".to_owned()),
                        ..Default::default()
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(names(&plan), vec!["A"]);
        let failed = plan
            .failed_suppliers
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(failed, vec!["X", "Y"]);
        assert_eq!(
            plan.failed_suppliers[0].location.as_deref(),
            Some("ที่ไหนก็ไม่รู้")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fails_when_no_supplier_can_be_located() {
        let result = optimizer(Arc::new(provider()))
            .optimize(PROJECT_ADDRESS, &[supplier("X", "ที่ไหนก็ไม่รู้")])
            .await;
        match result {
            Err(PlanningError::NoResolvableSuppliers { failed }) => assert_eq!(failed.len(), 1),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_project_location_is_fatal() {
        let result = optimizer(Arc::new(provider()))
            .optimize("ไม่มีโปรเจกต์นี้", &[supplier("A", "สวนเหนือ")])
            .await;
        assert!(matches!(
            result,
            Err(PlanningError::Geocoding(GeocodingError::NotFound { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_coordinates_skip_geocoding() {
        let provider = Arc::new(provider());
        let north = offset(PROJECT, 5_000.0, 0.0);
        let plan = optimizer(provider.clone())
            .optimize(
                &format!("{},{}", PROJECT.latitude, PROJECT.longitude),
                &[SelectedSupplier {
                    name: Some("A".to_owned()),
                    latitude: Some(north.latitude),
                    longitude: Some(north.longitude),
                    ..Default::default()
                }],
            )
            .await
            .unwrap();
        assert_eq!(provider.calls(), 0);
        assert_eq!(plan.suppliers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_the_supplier_directory() {
        let directory = Arc::new(InMemorySupplierDirectory::default().with_supplier(
            "sup_1",
            Supplier {
                name: "สวนในระบบ".to_owned(),
                location: Some("สวนใต้".to_owned()),
                latitude: None,
                longitude: None,
            },
        ));
        let plan = optimizer_with(
            Arc::new(provider()),
            Some(directory.clone()),
            OptimizerOptions::default(),
        )
        .optimize(
            PROJECT_ADDRESS,
            &[SelectedSupplier {
                id: Some(Id::from("sup_1")),
                ..Default::default()
            }],
        )
        .await
        .unwrap();

        assert_eq!(directory.lookups(), 1);
        assert_eq!(plan.suppliers[0].id, Some(Id::from("sup_1")));
        assert!((plan.total_distance_km - 3.0).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_route_includes_the_way_back() {
        let options = OptimizerOptions {
            sequencer: SequencerOptions {
                return_to_origin: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let plan = optimizer_with(Arc::new(provider()), None, options)
            .optimize(
                PROJECT_ADDRESS,
                &[supplier("A", "สวนเหนือ"), supplier("B", "สวนใต้")],
            )
            .await
            .unwrap();

        assert!(plan.route.returns_to_origin);
        assert!((plan.route.return_distance_meters.unwrap() - 5_000.0).abs() < 1.0);
        assert!((plan.total_distance_km - 16.0).abs() < 0.01);
    }
}
