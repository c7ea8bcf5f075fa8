use super::{AddCuisineRequest, AddDishesRequest, ValidationError, ValidationResult};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_CUISINE_NAME_LENGTH: usize = 200;
pub const MAX_DISH_NAME_LENGTH: usize = 200;
pub const MAX_TAG_LENGTH: usize = 100;

impl Validate for AddCuisineRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_cuisine_name(&self.name)?;
        validate_tags(&self.tags)?;
        for dish in &self.dishes {
            validate_dish_name(&dish.name)?;
            validate_tags(&dish.tags)?;
        }
        Ok(())
    }
}

impl Validate for AddDishesRequest {
    fn validate(&self) -> ValidationResult<()> {
        if self.cuisine.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: "cuisine".to_string(),
            });
        }
        for dish in &self.dishes {
            validate_dish_name(&dish.name)?;
            validate_tags(&dish.tags)?;
        }
        Ok(())
    }
}

/// Cuisine names are required and bounded
pub fn validate_cuisine_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }
    check_length("name", name, MAX_CUISINE_NAME_LENGTH)
}

/// Dish names may be empty; only the upper bound applies
pub fn validate_dish_name(name: &str) -> ValidationResult<()> {
    check_length("dishes.name", name, MAX_DISH_NAME_LENGTH)
}

pub fn validate_tags(tags: &[String]) -> ValidationResult<()> {
    for tag in tags {
        check_length("tags", tag, MAX_TAG_LENGTH)?;
    }
    Ok(())
}

fn check_length(field: &str, value: &str, max_length: usize) -> ValidationResult<()> {
    let actual_length = value.chars().count();
    if actual_length > max_length {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length,
            actual_length,
        });
    }
    Ok(())
}
