use bazaar_core::{Banner, BannerId, BannerInput};
use url::Url;

use super::{AdminResource, EditableResource};
use crate::components::{DataTable, FormField, FormValues};

/// Home page banners at `/admin/banners`.
pub struct Banners;

impl AdminResource for Banners {
    type Id = BannerId;
    type Record = Banner;

    const PATH: &'static str = "banners";
    const SINGULAR: &'static str = "Banner";
    const PLURAL: &'static str = "Banners";
    const COLUMNS: &'static [&'static str] = &["Position", "Title", "Link", "Active"];
    const EDITABLE: bool = true;

    fn id(record: &Banner) -> BannerId {
        record.id
    }

    fn cells(record: &Banner) -> Vec<String> {
        vec![
            record.position.to_string(),
            record.title.clone(),
            record.link.clone().unwrap_or_else(|| "-".to_string()),
            if record.active { "yes" } else { "no" }.to_string(),
        ]
    }

    /// Banners list in the order the home page shows them.
    fn table(records: &[Banner]) -> DataTable {
        let mut sorted: Vec<&Banner> = records.iter().collect();
        sorted.sort_by_key(|banner| banner.position);

        let mut table = DataTable::new(Self::COLUMNS);
        for banner in sorted {
            table.push(banner.id, Self::cells(banner));
        }
        table
    }
}

impl EditableResource for Banners {
    type Input = BannerInput;

    fn values(record: &Banner) -> FormValues {
        FormValues::new()
            .with("title", &record.title)
            .with("image_url", &record.image_url)
            .with("link", record.link.as_deref().unwrap_or_default())
            .with("position", record.position)
            .with_flag("active", record.active)
    }

    fn fields(values: &FormValues) -> Vec<FormField> {
        vec![
            FormField::text("title", "Title", values).required(),
            FormField::url("image_url", "Image URL", values).required(),
            FormField::text("link", "Link", values)
                .hint("A storefront path such as /categories/3."),
            FormField::number("position", "Position", values),
            FormField::checkbox("active", "Show on the home page", values),
        ]
    }

    fn parse(values: &FormValues) -> Result<BannerInput, Vec<String>> {
        let mut errors = Vec::new();
        let title = values.required("title", "Title", &mut errors);
        let image_url = values.required("image_url", "Image URL", &mut errors);
        if !image_url.is_empty() && Url::parse(&image_url).is_err() {
            errors.push("Image URL is not valid.".to_string());
        }
        let position: Option<i32> = values.optional("position", "Position", &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(BannerInput {
            title,
            image_url,
            link: Some(values.get("link").to_string()).filter(|link| !link.is_empty()),
            active: values.is_checked("active"),
            position: position.unwrap_or(0),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn banner(id: i64, position: i32, active: bool) -> Banner {
        Banner {
            id: BannerId::new(id),
            title: format!("Banner {id}"),
            image_url: "https://cdn.bazaar.in/diwali.jpg".to_string(),
            link: None,
            active,
            position,
        }
    }

    #[test]
    fn test_table_sorted_by_position() {
        let table = Banners::table(&[banner(1, 3, true), banner(2, 1, false)]);
        let ids: Vec<&str> = table.rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(table.rows[0].cells, vec!["1", "Banner 2", "-", "no"]);
    }

    #[test]
    fn test_unchecked_active_means_hidden() {
        let values = FormValues::new()
            .with("title", "Monsoon Sale")
            .with("image_url", "https://cdn.bazaar.in/monsoon.jpg")
            .with("link", "");
        let input = Banners::parse(&values).unwrap();
        assert!(!input.active);
        assert_eq!(input.link, None);
        assert_eq!(input.position, 0);
    }

    #[test]
    fn test_edit_values_keep_active_flag() {
        let input = Banners::parse(&Banners::values(&banner(5, 2, true))).unwrap();
        assert!(input.active);
        assert_eq!(input.position, 2);
    }

    #[test]
    fn test_invalid_image_url() {
        let values = FormValues::new()
            .with("title", "Sale")
            .with("image_url", "diwali.jpg");
        assert_eq!(
            Banners::parse(&values).unwrap_err(),
            vec!["Image URL is not valid."]
        );
    }
}
