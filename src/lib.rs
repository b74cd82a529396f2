reexport!(testing, test);
reexport!(error);
reexport!(config);
reexport!(catalog);
reexport!(ast);
reexport!(parser);
reexport!(editor);
reexport!(builder);
#[allow(unused_imports)]
pub(crate) use tracing::{debug, info, trace, warn};

#[macro_export]
macro_rules! reexport {
    ($module:ident) => {
        $crate::reexport!($module, false);
    };
    ($module:ident, test) => {
        $crate::reexport!($module, true);
    };
    ($module:ident, $is_test:literal) => {
        #[cfg_attr($is_test, cfg(test))]
        mod $module;
        #[cfg_attr($is_test, cfg(test))]
        #[allow(unused_imports)]
        #[allow(ambiguous_glob_reexports)]
        pub use $module::*;
    };
}
