/// Entity round-trips against a live Postgres
pub mod resource_record_tests;

/// DB-backed tests run only with `DATABASE_URL` set and `SKIP_DB_TESTS` unset.
pub(crate) fn db_tests_enabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}
