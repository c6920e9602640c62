//! [`Query`] collection related to the multiple [`Package`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::{domain::Package, read};

use super::DatabaseQuery;

/// Queries a list of [`Package`]s, the most recently created first.
pub type List = DatabaseQuery<By<Vec<Package>, read::package::list::Filter>>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::{
        domain::{package, Package},
        infra::database::memory::Memory,
        read::package::list::Filter,
        Query as _, Service,
    };

    use super::List;

    fn sample(slug: &str, category: package::Category, ty: &str) -> Package {
        let mut pkg = Package::sample(slug);
        pkg.document.category = category;
        pkg.document.r#type = package::Type::new(ty).unwrap();
        pkg
    }

    #[tokio::test]
    async fn filters_by_category_and_type() {
        use package::Category as C;

        let service = Service::for_tests(Memory::with_packages([
            sample("goa", C::RomanticHoneymoon, "domestic"),
            sample("bali", C::RomanticHoneymoon, "international"),
            sample("diwali", C::CelebrationPackages, "festival"),
        ]));

        let honeymoons = service
            .execute(List::by(Filter {
                category: Some(C::RomanticHoneymoon),
                ..Filter::default()
            }))
            .await
            .unwrap();
        assert_eq!(honeymoons.len(), 2);

        let international = service
            .execute(List::by(Filter {
                category: Some(C::RomanticHoneymoon),
                r#type: Some(package::Type::new("international").unwrap()),
                featured: None,
            }))
            .await
            .unwrap();
        assert_eq!(international.len(), 1);
        assert_eq!(international[0].slug.to_string(), "bali");
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let mut older = Package::sample("older");
        older.created_at = older.created_at - Duration::from_secs(60);
        let newer = Package::sample("newer");
        let service =
            Service::for_tests(Memory::with_packages([older, newer]));

        let all = service.execute(List::by(Filter::default())).await.unwrap();

        let slugs =
            all.iter().map(|p| p.slug.to_string()).collect::<Vec<_>>();
        assert_eq!(slugs, ["newer", "older"]);
    }
}
