use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    map_dishes_response, AddCuisineRequest, AddDishesRequest, Cuisine, Dish, NewCuisine,
    RepositoryError, ServiceError, ServiceResult, Validate,
};
use crate::observability::{BusinessTracingMiddleware, Metrics};
use crate::repositories::CuisineRepository;

/// Log a failed repository call, keeping the error for propagation
fn storage_error(step: &'static str) -> impl Fn(RepositoryError) -> RepositoryError {
    move |e| {
        crate::error_with_trace!(error = %e, step, "Storage call failed");
        e
    }
}

/// Service for creating and listing cuisines
pub struct CuisineService {
    repository: Arc<dyn CuisineRepository>,
    business_tracing: Option<BusinessTracingMiddleware>,
}

impl CuisineService {
    pub fn new(repository: Arc<dyn CuisineRepository>) -> Self {
        Self {
            repository,
            business_tracing: None,
        }
    }

    /// Count operation outcomes in `cuisine_operations_total`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.business_tracing = Some(BusinessTracingMiddleware::new(metrics));
        self
    }

    async fn traced<T, F>(&self, operation: &str, future: F) -> ServiceResult<T>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        match &self.business_tracing {
            Some(tracing) => tracing.trace_cuisine_operation(operation, future).await,
            None => future.await,
        }
    }

    /// Store a cuisine and its dishes.
    ///
    /// The cuisine document is written first, then the dishes, then the
    /// cuisine is patched to embed them. A failure after the first write
    /// leaves the partial documents in storage.
    #[instrument(skip(self, request), fields(name = %request.name, dishes = request.dishes.len()))]
    pub async fn add_new_cuisine(&self, request: AddCuisineRequest) -> ServiceResult<Cuisine> {
        self.traced("add_cuisine", self.create_cuisine(request)).await
    }

    async fn create_cuisine(&self, request: AddCuisineRequest) -> ServiceResult<Cuisine> {
        if let Err(e) = request.validate() {
            crate::warn_with_trace!(error = %e, "Rejected cuisine request");
            return Err(e.into());
        }

        // Not atomic with the insert below; concurrent creates may both pass
        if self
            .repository
            .exists_by_name(&request.name)
            .await
            .map_err(storage_error("exists_by_name"))?
        {
            crate::warn_with_trace!("Cuisine name already taken");
            return Err(ServiceError::DuplicateCuisine {
                name: request.name,
            });
        }

        let new_cuisine = NewCuisine::from(&request);
        let cuisine_id = self
            .repository
            .insert_cuisine(&new_cuisine)
            .await
            .map_err(storage_error("insert_cuisine"))?;
        crate::info_with_trace!(cuisine_id = %cuisine_id, "Cuisine inserted");

        let mut dishes = Vec::new();
        if !request.dishes.is_empty() {
            dishes = self
                .add_all_dishes(AddDishesRequest::new(cuisine_id.clone(), request.dishes))
                .await?;

            self.repository
                .set_cuisine_dishes(&cuisine_id, &dishes)
                .await
                .map_err(storage_error("set_cuisine_dishes"))?;
            crate::info_with_trace!(
                cuisine_id = %cuisine_id,
                dishes = dishes.len(),
                "Cuisine updated with dishes"
            );
        }

        Ok(Cuisine::from_parts(cuisine_id, new_cuisine, dishes))
    }

    /// Insert dishes owned by `request.cuisine` and return them with their
    /// assigned ids and back-references filled in
    #[instrument(skip(self, request), fields(cuisine_id = %request.cuisine, dishes = request.dishes.len()))]
    pub async fn add_all_dishes(&self, request: AddDishesRequest) -> ServiceResult<Vec<Dish>> {
        request.validate()?;

        let new_ids = self
            .repository
            .insert_dishes(&request.cuisine, &request.dishes)
            .await
            .map_err(storage_error("insert_dishes"))?;
        crate::info_with_trace!(count = new_ids.len(), "Dishes inserted");

        Ok(map_dishes_response(new_ids, &request.dishes, &request.cuisine))
    }

    #[instrument(skip(self))]
    pub async fn get_all_cuisines(&self) -> ServiceResult<Vec<Cuisine>> {
        self.traced("list_cuisines", async {
            let cuisines = self
                .repository
                .find_all()
                .await
                .map_err(storage_error("find_all"))?;
            crate::info_with_trace!("Found {} cuisines", cuisines.len());
            Ok(cuisines)
        })
        .await
    }
}
