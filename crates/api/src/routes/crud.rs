//! Router factory for tables served by the generic CRUD handlers.

use axum::routing::MethodRouter;
use axum::Router;
use ifdo_db::resource::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::handlers::crud;
use crate::state::AppState;

/// Which of the five operations a resource exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrudOps {
    pub index: bool,
    pub show: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl CrudOps {
    pub const ALL: Self = Self {
        index: true,
        show: true,
        create: true,
        update: true,
        delete: true,
    };
}

/// Build the routes for one table.
///
/// ```text
/// GET    /       -> index   (ops.index)
/// POST   /       -> create  (ops.create, body C)
/// GET    /{id}   -> show    (ops.show)
/// PUT    /{id}   -> update  (ops.update, body U)
/// DELETE /{id}   -> delete  (ops.delete)
/// ```
pub fn crud_router<R, C, U>(ops: CrudOps) -> Router<AppState>
where
    R: Resource + Sync,
    C: DeserializeOwned + Serialize + Send + Sync + 'static,
    U: DeserializeOwned + Serialize + Send + Sync + 'static,
{
    let mut collection: MethodRouter<AppState> = MethodRouter::new();
    if ops.index {
        collection = collection.get(crud::index::<R>);
    }
    if ops.create {
        collection = collection.post(crud::create::<R, C>);
    }

    let mut member: MethodRouter<AppState> = MethodRouter::new();
    if ops.show {
        member = member.get(crud::show::<R>);
    }
    if ops.update {
        member = member.put(crud::update::<R, U>);
    }
    if ops.delete {
        member = member.delete(crud::delete::<R>);
    }

    Router::new().route("/", collection).route("/{id}", member)
}
