use bazaar_core::{Review, ReviewId};

use super::{AdminResource, excerpt};

/// Shopper reviews at `/admin/reviews`. Moderation only: list and delete.
pub struct Reviews;

impl AdminResource for Reviews {
    type Id = ReviewId;
    type Record = Review;

    const PATH: &'static str = "reviews";
    const SINGULAR: &'static str = "Review";
    const PLURAL: &'static str = "Reviews";
    const COLUMNS: &'static [&'static str] = &["Product", "Author", "Rating", "Comment", "Posted"];

    fn id(record: &Review) -> ReviewId {
        record.id
    }

    fn cells(record: &Review) -> Vec<String> {
        vec![
            format!("#{}", record.product_id),
            record.author.clone(),
            format!("{}/5", record.rating),
            excerpt(&record.comment, 120),
            record.created_at.format("%d %b %Y").to_string(),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::ProductId;
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_cells() {
        let review = Review {
            id: ReviewId::new(31),
            product_id: ProductId::new(4),
            author: "Meera".to_string(),
            rating: 2,
            comment: "Arrived late".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 8, 15, 9, 30, 0).unwrap(),
        };
        assert_eq!(
            Reviews::cells(&review),
            vec!["#4", "Meera", "2/5", "Arrived late", "15 Aug 2026"]
        );
    }
}
