//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web;

/// Generate a `pub fn routes(cfg: &mut ServiceConfig)` for a route module.
///
/// `route` entries register an attribute-macro handler (`#[get(...)]` etc.),
/// `scope` entries call the `routes` function of a child module.
///
/// ```ignore
/// macros_utils::routes! {
///     route list_monitors,
///     route create_monitor,
///     scope logs,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    (@register $cfg:ident, route $handler:ident) => {
        $cfg.service($handler);
    };
    (@register $cfg:ident, scope $module:ident) => {
        $cfg.configure($module::routes);
    };
    ($($kind:ident $item:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::actix_web::web::ServiceConfig) {
            $($crate::routes!(@register cfg, $kind $item);)*
        }
    };
}
