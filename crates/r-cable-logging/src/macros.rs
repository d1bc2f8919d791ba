//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Context-enriched logging macros."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Logging macros. Each accepts an optional leading `context = <LogContext>`.

/// Emit an event at `$level` with the four context fields. Extra fields go in a
/// leading `{ key = value, .. }` group before the format arguments.
#[doc(hidden)]
#[macro_export]
macro_rules! cable_event {
    ($level:expr, $ctx:expr, { $($key:ident = $value:expr),* $(,)? }, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext = $ctx;
        $crate::__tracing::event!(
            $level,
            project = ctx.project.unwrap_or(""),
            run = ctx.run.unwrap_or(""),
            segment = ctx.segment.unwrap_or(""),
            bus = ctx.bus.unwrap_or(""),
            $($key = $value,)*
            message = %format_args!($($arg)+)
        );
    }};
    ($level:expr, $ctx:expr, $($arg:tt)+) => {
        $crate::cable_event!($level, $ctx, {}, $($arg)+)
    };
}

/// Informational event enriched with R-CABLE context.
#[macro_export]
macro_rules! cable_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::INFO, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::INFO, &$crate::LogContext::default(), $($arg)+)
    };
}

/// Debug event enriched with R-CABLE context.
#[macro_export]
macro_rules! cable_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::DEBUG, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::DEBUG, &$crate::LogContext::default(), $($arg)+)
    };
}

/// Warning event enriched with R-CABLE context.
#[macro_export]
macro_rules! cable_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::WARN, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::WARN, &$crate::LogContext::default(), $($arg)+)
    };
}

/// Error event enriched with R-CABLE context.
#[macro_export]
macro_rules! cable_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::ERROR, &$ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::cable_event!($crate::__tracing::Level::ERROR, &$crate::LogContext::default(), $($arg)+)
    };
}
