use time::OffsetDateTime;

pub trait TimeProvider: Clone + Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;

    fn now_millis(&self) -> i64 {
        (self.now().unix_timestamp_nanos() / 1_000_000) as i64
    }
}
