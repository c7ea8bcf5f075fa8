#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::net::TcpListener;
use uuid::Uuid;

use food_roulette_rs::config::ServerConfig;
use food_roulette_rs::create_app;
use food_roulette_rs::models::{Cuisine, Dish, NewCuisine, RepositoryError, RepositoryResult};
use food_roulette_rs::repositories::CuisineRepository;
use food_roulette_rs::services::CuisineService;
use food_roulette_rs::Metrics;

/// CuisineRepository backed by a Vec, in insertion order
#[derive(Clone, Default)]
pub struct InMemoryCuisineRepository {
    cuisines: Arc<Mutex<Vec<Cuisine>>>,
    dishes: Arc<Mutex<Vec<Dish>>>,
    fail_dish_inserts: bool,
    find_all_delay: Option<Duration>,
}

impl InMemoryCuisineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dish insert fails, leaving the cuisine document behind
    pub fn failing_dish_inserts() -> Self {
        Self {
            fail_dish_inserts: true,
            ..Self::default()
        }
    }

    /// `find_all` sleeps for `delay` before answering
    pub fn slow_find_all(delay: Duration) -> Self {
        Self {
            find_all_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn stored_cuisines(&self) -> Vec<Cuisine> {
        self.cuisines.lock().unwrap().clone()
    }

    pub fn stored_dishes(&self) -> Vec<Dish> {
        self.dishes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CuisineRepository for InMemoryCuisineRepository {
    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        Ok(self.cuisines.lock().unwrap().iter().any(|c| c.name == name))
    }

    async fn insert_cuisine(&self, cuisine: &NewCuisine) -> RepositoryResult<String> {
        let id = Uuid::new_v4().to_string();
        self.cuisines.lock().unwrap().push(Cuisine::from_parts(
            id.clone(),
            cuisine.clone(),
            Vec::new(),
        ));
        Ok(id)
    }

    async fn insert_dishes(
        &self,
        cuisine_id: &str,
        dishes: &[Dish],
    ) -> RepositoryResult<Vec<String>> {
        if self.fail_dish_inserts {
            return Err(RepositoryError::UnprocessedItems {
                table_name: "Dishes".to_string(),
                count: dishes.len(),
            });
        }

        let mut stored = self.dishes.lock().unwrap();
        let ids = dishes
            .iter()
            .map(|dish| {
                let id = Uuid::new_v4().to_string();
                stored.push(Dish {
                    id: id.clone(),
                    cuisine: cuisine_id.to_string(),
                    name: dish.name.clone(),
                    tags: dish.tags.clone(),
                });
                id
            })
            .collect();
        Ok(ids)
    }

    async fn set_cuisine_dishes(&self, cuisine_id: &str, dishes: &[Dish]) -> RepositoryResult<()> {
        let mut cuisines = self.cuisines.lock().unwrap();
        let cuisine = cuisines
            .iter_mut()
            .find(|c| c.id == cuisine_id)
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: format!("Cuisine {} not found", cuisine_id),
            })?;
        cuisine.dishes = dishes.to_vec();
        Ok(())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Cuisine>> {
        if let Some(delay) = self.find_all_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.cuisines.lock().unwrap().clone())
    }
}

pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 6080,
        request_timeout_seconds: 5,
        max_request_size: 1024 * 1024,
        host_name: "integration-host".to_string(),
    }
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub repository: InMemoryCuisineRepository,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_repository(InMemoryCuisineRepository::new()).await
    }

    pub async fn with_repository(repository: InMemoryCuisineRepository) -> Self {
        Self::with_config(repository, test_server_config()).await
    }

    pub async fn with_config(repository: InMemoryCuisineRepository, server: ServerConfig) -> Self {
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let service = Arc::new(
            CuisineService::new(Arc::new(repository.clone())).with_metrics(metrics.clone()),
        );
        let app = create_app(service, metrics, &server);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            client: Client::new(),
            base_url,
            repository,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
