pub const MIN_COMPLETE_CHARS: usize = 200;

const ELLIPSIS: &str = "...";
const NUMERIC_ENTITY: &str = "&#";

pub fn is_truncated(body: &str) -> bool {
    body.ends_with(ELLIPSIS)
        || body.contains(NUMERIC_ENTITY)
        || body.trim().chars().count() < MIN_COMPLETE_CHARS
}
