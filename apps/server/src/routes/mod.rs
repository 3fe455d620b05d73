mod jobs;
mod logs;
mod monitors;

macros_utils::routes! {
    scope monitors,
    scope logs,
    scope jobs,
}
