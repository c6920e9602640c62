//! GraphQL API definitions.

mod mutation;
pub mod package;
mod query;
pub mod scalar;
mod subscription;
pub mod user;

use crate::define_error;

pub use self::{
    mutation::Mutation, package::Package, query::Query,
    subscription::Subscription, user::User,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an administrator"]
        Admin,
    }
}

#[cfg(test)]
mod spec {
    use super::{Mutation, Query, Schema, Subscription};

    #[test]
    fn exposes_package_surface() {
        let sdl = Schema::new(Query, Mutation, Subscription).as_sdl();

        for field in [
            "packageBySlug(",
            "costSection(all: Boolean)",
            "updatePackage(",
            "createUserSessionByPhone(",
            "input PackageInput",
            "enum UserRole",
        ] {
            assert!(sdl.contains(field), "missing `{field}` in:\n{sdl}");
        }
    }
}
