/// Similar to `info!` macro in tracing, and logs through it.
/// You can pass in the starting time and it will log how long it took from starting time to now.
/// ```
/// use book_scrap::info_time;
/// info_time!("str {}, {}", 1, 2);
/// let time = chrono::Local::now();
/// info_time!(time, "str {}, {}", 1, 2);
/// ```
#[macro_export]
macro_rules! info_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = ::chrono::Local::now();
        ::tracing::info!("{:<30} : {}", local_now, format!($strfm, $($arg),*));
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = ::chrono::Local::now();
        let run_time = $crate::elapsed_secs($time, local_now);
        ::tracing::info!(
            "{:<30} : {} | RUNTIME: {} sec",
            local_now,
            format!($strfm, $($arg),*),
            run_time
        );
    }};
}
