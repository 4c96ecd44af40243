#[cfg(test)]
mod tests {
    use rivet::Connection;
    use rivet_sqlite::SqliteDriver;
    use rivet_tests::{execute_tests, init_logs};

    #[test]
    fn sqlite() {
        init_logs();
        execute_tests(|| {
            Connection::open::<SqliteDriver>("sqlite://:memory:")
                .expect("Could not open the database")
        });
    }
}
