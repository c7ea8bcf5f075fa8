use serde::{Deserialize, Deserializer, Serialize};

/// A named category grouping dishes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cuisine {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub cuisine_type: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dishes: Vec<Dish>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
}

/// An item belonging to exactly one cuisine.
///
/// `cuisine` is a back-reference to the owning cuisine's identifier, filled
/// in by the storage layer when the dish is inserted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dish {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cuisine: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
}

/// Request body for `POST /api/add/cuisine`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddCuisineRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub cuisine_type: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dishes: Vec<Dish>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
}

/// A batch of dishes to attach to an already stored cuisine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddDishesRequest {
    #[serde(default)]
    pub cuisine: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dishes: Vec<Dish>,
}

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Cuisine document as written by the first insert, before any id exists
#[derive(Debug, Clone, PartialEq)]
pub struct NewCuisine {
    pub name: String,
    pub cuisine_type: String,
    pub tags: Vec<String>,
}

impl From<&AddCuisineRequest> for NewCuisine {
    fn from(request: &AddCuisineRequest) -> Self {
        Self {
            name: request.name.clone(),
            cuisine_type: request.cuisine_type.clone(),
            tags: request.tags.clone(),
        }
    }
}

impl Cuisine {
    /// Build the record returned to callers once the writes have landed
    pub fn from_parts(id: String, new_cuisine: NewCuisine, dishes: Vec<Dish>) -> Self {
        Self {
            id,
            name: new_cuisine.name,
            cuisine_type: new_cuisine.cuisine_type,
            dishes,
            tags: new_cuisine.tags,
        }
    }
}

impl AddDishesRequest {
    pub fn new(cuisine: impl Into<String>, dishes: Vec<Dish>) -> Self {
        Self {
            cuisine: cuisine.into(),
            name: String::new(),
            dishes,
        }
    }
}

/// Zip storage-assigned identifiers with the dishes they were assigned to.
///
/// Identifiers are matched positionally; surplus entries on either side are
/// dropped.
pub fn map_dishes_response(new_ids: Vec<String>, dishes: &[Dish], cuisine_id: &str) -> Vec<Dish> {
    new_ids
        .into_iter()
        .zip(dishes)
        .map(|(id, dish)| Dish {
            id,
            cuisine: cuisine_id.to_string(),
            name: dish.name.clone(),
            tags: dish.tags.clone(),
        })
        .collect()
}
