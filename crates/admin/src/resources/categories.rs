use bazaar_core::{Category, CategoryId, CategoryInput};

use super::{AdminResource, EditableResource, excerpt, slug_or_derived};
use crate::components::{FormField, FormValues};

/// Categories at `/admin/categories`.
pub struct Categories;

impl AdminResource for Categories {
    type Id = CategoryId;
    type Record = Category;

    const PATH: &'static str = "categories";
    const SINGULAR: &'static str = "Category";
    const PLURAL: &'static str = "Categories";
    const COLUMNS: &'static [&'static str] = &["Name", "Slug", "Description"];
    const EDITABLE: bool = true;

    fn id(record: &Category) -> CategoryId {
        record.id
    }

    fn cells(record: &Category) -> Vec<String> {
        vec![
            record.name.clone(),
            record.slug.clone(),
            excerpt(&record.description, 80),
        ]
    }
}

impl EditableResource for Categories {
    type Input = CategoryInput;

    fn values(record: &Category) -> FormValues {
        FormValues::new()
            .with("name", &record.name)
            .with("slug", &record.slug)
            .with("description", &record.description)
    }

    fn fields(values: &FormValues) -> Vec<FormField> {
        vec![
            FormField::text("name", "Name", values).required(),
            FormField::text("slug", "Slug", values).hint("Leave blank to derive it from the name."),
            FormField::textarea("description", "Description", values),
        ]
    }

    fn parse(values: &FormValues) -> Result<CategoryInput, Vec<String>> {
        let mut errors = Vec::new();
        let name = values.required("name", "Name", &mut errors);
        let slug = slug_or_derived(values, &name);
        if slug.is_empty() && !name.is_empty() {
            errors.push("Slug must contain letters or digits.".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CategoryInput {
            name,
            slug,
            description: values.get("description").to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        let values = FormValues::new()
            .with("name", "Spices & Masalas")
            .with("description", " Whole and ground ");
        let input = Categories::parse(&values).unwrap();
        assert_eq!(input.slug, "spices-masalas");
        assert_eq!(input.description, "Whole and ground");
    }

    #[test]
    fn test_symbol_only_name_needs_a_slug() {
        let values = FormValues::new().with("name", "★★★");
        let errors = Categories::parse(&values).unwrap_err();
        assert_eq!(errors, vec!["Slug must contain letters or digits."]);
    }
}
