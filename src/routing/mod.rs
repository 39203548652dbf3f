//! Controller routes and the compiled route table.
//!
//! Controllers declare a prefix and their actions through
//! [`Controller::routes`]. [`RouteTableBuilder`] joins prefix and path,
//! compiles each template and fixes the match order once at startup;
//! [`RouteTable::find`] then returns the first route matching a request.

mod controller;
mod pattern;
mod route;
mod table;

pub use controller::{action_not_found, Controller};
pub use pattern::{join, normalize_request_path, PathPattern};
pub use route::{ActionRoute, ControllerRoutes};
pub use table::{Route, RouteMatch, RouteOverlap, RouteTable, RouteTableBuilder};
