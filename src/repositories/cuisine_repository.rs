use async_trait::async_trait;
use aws_sdk_dynamodb::operation::scan::builders::ScanFluentBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, Select, WriteRequest};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::models::{Cuisine, Dish, NewCuisine, RepositoryError, RepositoryResult};
use crate::observability::{DatabaseTracingMiddleware, Metrics};

/// BatchWriteItem accepts at most 25 put requests per call
pub const BATCH_WRITE_LIMIT: usize = 25;

/// Persistence port for cuisine and dish documents
#[async_trait]
pub trait CuisineRepository: Send + Sync {
    /// Whether any stored cuisine already uses `name`
    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool>;

    /// Insert a cuisine document and return the identifier assigned to it
    async fn insert_cuisine(&self, cuisine: &NewCuisine) -> RepositoryResult<String>;

    /// Insert dish documents owned by `cuisine_id`.
    ///
    /// Returns the assigned identifiers in the same order as `dishes`.
    async fn insert_dishes(&self, cuisine_id: &str, dishes: &[Dish])
        -> RepositoryResult<Vec<String>>;

    /// Patch a stored cuisine document so it references `dishes`
    async fn set_cuisine_dishes(&self, cuisine_id: &str, dishes: &[Dish]) -> RepositoryResult<()>;

    /// Every stored cuisine, in storage order
    async fn find_all(&self) -> RepositoryResult<Vec<Cuisine>>;
}

#[cfg(test)]
mockall::mock! {
    pub TestCuisineRepository {}

    #[async_trait]
    impl CuisineRepository for TestCuisineRepository {
        async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool>;
        async fn insert_cuisine(&self, cuisine: &NewCuisine) -> RepositoryResult<String>;
        async fn insert_dishes(&self, cuisine_id: &str, dishes: &[Dish]) -> RepositoryResult<Vec<String>>;
        async fn set_cuisine_dishes(&self, cuisine_id: &str, dishes: &[Dish]) -> RepositoryResult<()>;
        async fn find_all(&self) -> RepositoryResult<Vec<Cuisine>>;
    }
}

/// DynamoDB implementation of the CuisineRepository trait
pub struct DynamoDbCuisineRepository {
    client: Arc<DynamoDbClient>,
    cuisines_table: String,
    dishes_table: String,
    region: String,
    db_tracing: Option<DatabaseTracingMiddleware>,
}

impl DynamoDbCuisineRepository {
    pub fn new(
        client: Arc<DynamoDbClient>,
        cuisines_table: String,
        dishes_table: String,
        region: String,
    ) -> Self {
        Self {
            client,
            cuisines_table,
            dishes_table,
            region,
            db_tracing: None,
        }
    }

    /// Record per-operation database metrics
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.db_tracing = Some(DatabaseTracingMiddleware::new(metrics));
        self
    }

    pub fn cuisines_table(&self) -> &str {
        &self.cuisines_table
    }

    pub fn dishes_table(&self) -> &str {
        &self.dishes_table
    }

    /// Strongly consistent scan counting cuisines called `name`
    fn name_lookup(
        &self,
        name: &str,
        start_key: Option<HashMap<String, AttributeValue>>,
    ) -> ScanFluentBuilder {
        self.client
            .scan()
            .table_name(&self.cuisines_table)
            .consistent_read(true)
            .filter_expression("#name = :name")
            .expression_attribute_names("#name", "name")
            .expression_attribute_values(":name", AttributeValue::S(name.to_string()))
            .select(Select::Count)
            .set_exclusive_start_key(start_key)
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Client span for a single DynamoDB call
    fn create_dynamodb_span(&self, operation: &str, table: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),
            "rpc.system" = "aws-api",
            "rpc.service" = "DynamoDB",
            "rpc.method" = operation,
            "db.system" = "dynamodb",
            "db.name" = %table,
            "db.operation" = operation,
            "aws.region" = %self.region,
        )
    }

    async fn traced<T, F>(&self, operation: &str, table: &str, future: F) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>> + Send,
        T: Send,
    {
        let span = self.create_dynamodb_span(operation, table);
        match &self.db_tracing {
            Some(db_tracing) => {
                db_tracing
                    .trace_operation(operation, table, future)
                    .instrument(span)
                    .await
            }
            None => future.instrument(span).await,
        }
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, table: &str, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);

        if matches!(error, DynamoDbError::ResourceNotFoundException(_)) {
            return RepositoryError::TableNotFound {
                table_name: table.to_string(),
            };
        }

        RepositoryError::AwsSdk {
            message: error.to_string(),
        }
    }
}

fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().cloned().map(AttributeValue::S).collect())
}

fn read_string_list(item: &HashMap<String, AttributeValue>, key: &str) -> Vec<String> {
    item.get(key)
        .and_then(|v| v.as_l().ok())
        .map(|list| list.iter().filter_map(|v| v.as_s().ok()).cloned().collect())
        .unwrap_or_default()
}

fn read_string(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).cloned()
}

/// Convert a Dish to DynamoDB attribute values
pub fn dish_to_item(dish: &Dish) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();

    item.insert("id".to_string(), AttributeValue::S(dish.id.clone()));
    item.insert("cuisine".to_string(), AttributeValue::S(dish.cuisine.clone()));
    if !dish.name.is_empty() {
        item.insert("name".to_string(), AttributeValue::S(dish.name.clone()));
    }
    item.insert("tags".to_string(), string_list(&dish.tags));

    item
}

pub fn item_to_dish(item: &HashMap<String, AttributeValue>) -> RepositoryResult<Dish> {
    let id = read_string(item, "id").ok_or_else(|| RepositoryError::InvalidItem {
        message: "Dish missing id".to_string(),
    })?;

    Ok(Dish {
        id,
        cuisine: read_string(item, "cuisine").unwrap_or_default(),
        name: read_string(item, "name").unwrap_or_default(),
        tags: read_string_list(item, "tags"),
    })
}

/// Document written by the initial cuisine insert
pub fn cuisine_to_item(id: &str, cuisine: &NewCuisine) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();

    item.insert("id".to_string(), AttributeValue::S(id.to_string()));
    item.insert("name".to_string(), AttributeValue::S(cuisine.name.clone()));
    if !cuisine.cuisine_type.is_empty() {
        item.insert(
            "type".to_string(),
            AttributeValue::S(cuisine.cuisine_type.clone()),
        );
    }
    item.insert("tags".to_string(), string_list(&cuisine.tags));

    item
}

/// Embedded dish list stored on the cuisine document
pub fn dishes_attribute(dishes: &[Dish]) -> AttributeValue {
    AttributeValue::L(
        dishes
            .iter()
            .map(|dish| AttributeValue::M(dish_to_item(dish)))
            .collect(),
    )
}

pub fn item_to_cuisine(item: HashMap<String, AttributeValue>) -> RepositoryResult<Cuisine> {
    let id = read_string(&item, "id").ok_or_else(|| RepositoryError::InvalidItem {
        message: "Cuisine missing id".to_string(),
    })?;

    let name = read_string(&item, "name").ok_or_else(|| RepositoryError::InvalidItem {
        message: "Cuisine missing name".to_string(),
    })?;

    let dishes = match item.get("dishes").and_then(|v| v.as_l().ok()) {
        Some(list) => list
            .iter()
            .filter_map(|v| v.as_m().ok())
            .map(item_to_dish)
            .collect::<RepositoryResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Cuisine {
        id,
        name,
        cuisine_type: read_string(&item, "type").unwrap_or_default(),
        dishes,
        tags: read_string_list(&item, "tags"),
    })
}

#[async_trait]
impl CuisineRepository for DynamoDbCuisineRepository {
    #[instrument(skip(self), fields(table = %self.cuisines_table))]
    async fn exists_by_name(&self, name: &str) -> RepositoryResult<bool> {
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let start_key = exclusive_start_key.take();
            let response = self
                .traced("Scan", &self.cuisines_table, async {
                    self.name_lookup(name, start_key)
                        .send()
                        .await
                        .map_err(|e| self.map_dynamodb_error(&self.cuisines_table, e.into()))
                })
                .await?;

            if response.count() > 0 {
                info!("Cuisine name {} already taken", name);
                return Ok(true);
            }

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        info!("Cuisine name {} is free", name);
        Ok(false)
    }

    #[instrument(skip(self, cuisine), fields(table = %self.cuisines_table, name = %cuisine.name))]
    async fn insert_cuisine(&self, cuisine: &NewCuisine) -> RepositoryResult<String> {
        let id = Self::new_id();
        let item = cuisine_to_item(&id, cuisine);

        self.traced("PutItem", &self.cuisines_table, async {
            self.client
                .put_item()
                .table_name(&self.cuisines_table)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(&self.cuisines_table, e.into()))
        })
        .await?;

        info!(cuisine_id = %id, "Inserted new cuisine: {} into database", cuisine.name);
        Ok(id)
    }

    #[instrument(skip(self, dishes), fields(table = %self.dishes_table, cuisine_id = %cuisine_id, count = dishes.len()))]
    async fn insert_dishes(
        &self,
        cuisine_id: &str,
        dishes: &[Dish],
    ) -> RepositoryResult<Vec<String>> {
        if dishes.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(dishes.len());
        let mut requests = Vec::with_capacity(dishes.len());

        for dish in dishes {
            let id = Self::new_id();
            let stored = Dish {
                id: id.clone(),
                cuisine: cuisine_id.to_string(),
                name: dish.name.clone(),
                tags: dish.tags.clone(),
            };

            let put = PutRequest::builder()
                .set_item(Some(dish_to_item(&stored)))
                .build()
                .map_err(|e| RepositoryError::AwsSdk {
                    message: format!("Failed to build put request: {}", e),
                })?;

            requests.push(WriteRequest::builder().put_request(put).build());
            ids.push(id);
        }

        for chunk in requests.chunks(BATCH_WRITE_LIMIT) {
            let response = self
                .traced("BatchWriteItem", &self.dishes_table, async {
                    self.client
                        .batch_write_item()
                        .request_items(self.dishes_table.clone(), chunk.to_vec())
                        .send()
                        .await
                        .map_err(|e| self.map_dynamodb_error(&self.dishes_table, e.into()))
                })
                .await?;

            let unprocessed: usize = response
                .unprocessed_items()
                .map(|items| items.values().map(Vec::len).sum())
                .unwrap_or(0);

            if unprocessed > 0 {
                warn!("Batch write left {} dishes unprocessed", unprocessed);
                return Err(RepositoryError::UnprocessedItems {
                    table_name: self.dishes_table.clone(),
                    count: unprocessed,
                });
            }
        }

        info!("Inserted {} dishes", ids.len());
        Ok(ids)
    }

    #[instrument(skip(self, dishes), fields(table = %self.cuisines_table, cuisine_id = %cuisine_id))]
    async fn set_cuisine_dishes(&self, cuisine_id: &str, dishes: &[Dish]) -> RepositoryResult<()> {
        self.traced("UpdateItem", &self.cuisines_table, async {
            self.client
                .update_item()
                .table_name(&self.cuisines_table)
                .key("id", AttributeValue::S(cuisine_id.to_string()))
                .update_expression("SET dishes = :dishes")
                .expression_attribute_values(":dishes", dishes_attribute(dishes))
                .condition_expression("attribute_exists(id)")
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(&self.cuisines_table, e.into()))
        })
        .await?;

        info!("Updated cuisine with {} dishes", dishes.len());
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.cuisines_table))]
    async fn find_all(&self) -> RepositoryResult<Vec<Cuisine>> {
        let mut cuisines = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let start_key = exclusive_start_key.take();
            let response = self
                .traced("Scan", &self.cuisines_table, async {
                    self.client
                        .scan()
                        .table_name(&self.cuisines_table)
                        .set_exclusive_start_key(start_key)
                        .send()
                        .await
                        .map_err(|e| self.map_dynamodb_error(&self.cuisines_table, e.into()))
                })
                .await?;

            for item in response.items.unwrap_or_default() {
                match item_to_cuisine(item) {
                    Ok(cuisine) => cuisines.push(cuisine),
                    Err(e) => {
                        warn!("Failed to parse cuisine item: {}", e);
                        continue;
                    }
                }
            }

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        info!("Found {} cuisines", cuisines.len());
        Ok(cuisines)
    }
}
