use bazaar_core::{CategoryId, Product, ProductId, ProductInput};
use rust_decimal::Decimal;
use url::Url;

use super::{AdminResource, EditableResource, excerpt, slug_or_derived};
use crate::components::{FormField, FormValues};

/// Products at `/admin/products`.
pub struct Products;

impl AdminResource for Products {
    type Id = ProductId;
    type Record = Product;

    const PATH: &'static str = "products";
    const SINGULAR: &'static str = "Product";
    const PLURAL: &'static str = "Products";
    const COLUMNS: &'static [&'static str] =
        &["Name", "Slug", "Price", "Stock", "Category", "Rating"];
    const EDITABLE: bool = true;

    fn id(record: &Product) -> ProductId {
        record.id
    }

    fn cells(record: &Product) -> Vec<String> {
        vec![
            excerpt(&record.name, 60),
            record.slug.clone(),
            record.price.to_string(),
            record.stock.to_string(),
            record
                .category_id
                .map_or_else(|| "-".to_string(), |id| format!("#{id}")),
            if record.review_count == 0 {
                "-".to_string()
            } else {
                format!("{:.1} ({})", record.rating, record.review_count)
            },
        ]
    }
}

impl EditableResource for Products {
    type Input = ProductInput;

    fn values(record: &Product) -> FormValues {
        FormValues::new()
            .with("name", &record.name)
            .with("slug", &record.slug)
            .with("description", &record.description)
            .with("price", record.price.amount)
            .with("stock", record.stock)
            .with(
                "category_id",
                record.category_id.map(|id| id.to_string()).unwrap_or_default(),
            )
            .with("images", record.images.join("\n"))
    }

    fn fields(values: &FormValues) -> Vec<FormField> {
        vec![
            FormField::text("name", "Name", values).required(),
            FormField::text("slug", "Slug", values).hint("Leave blank to derive it from the name."),
            FormField::textarea("description", "Description", values),
            FormField::text("price", "Price (₹)", values).required(),
            FormField::number("stock", "Stock", values),
            FormField::number("category_id", "Category ID", values),
            FormField::textarea("images", "Image URLs", values).hint("One URL per line."),
        ]
    }

    fn parse(values: &FormValues) -> Result<ProductInput, Vec<String>> {
        let mut errors = Vec::new();

        let name = values.required("name", "Name", &mut errors);
        let price: Option<Decimal> = values.parsed("price", "Price", &mut errors);
        if price.is_some_and(|price| price.is_sign_negative()) {
            errors.push("Price cannot be negative.".to_string());
        }
        let stock: Option<u32> = values.optional("stock", "Stock", &mut errors);
        let category_id: Option<CategoryId> =
            values.optional("category_id", "Category ID", &mut errors);

        let images = values.lines("images");
        for image in &images {
            if Url::parse(image).is_err() {
                errors.push(format!("Image URL {image} is not valid."));
            }
        }

        let slug = slug_or_derived(values, &name);
        if slug.is_empty() && !name.is_empty() {
            errors.push("Slug must contain letters or digits.".to_string());
        }

        match (errors.is_empty(), price) {
            (true, Some(price)) => Ok(ProductInput {
                name,
                slug,
                description: values.get("description").to_string(),
                price,
                stock: stock.unwrap_or(0),
                category_id,
                images,
            }),
            _ => Err(errors),
        }
    }
}
