#[cfg(test)]
mod tests {
    use rivet::{
        Backend, Connection, Definition, EntityType, Executor, FieldSpec, Value, conditions,
        data,
    };
    use rivet_sqlite::{SqliteConnection, SqliteDriver};
    use rivet_tests::{init_logs, silent_logs};
    use std::{fs, path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH)).is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(SqliteConnection::connect("duckdb://some_value").is_err());
            assert!(Connection::open::<SqliteDriver>("postgres://localhost").is_err());
        }
    }

    #[test]
    fn statements() {
        init_logs();
        let mut connection =
            SqliteConnection::connect("sqlite://:memory:").expect("Could not open the database");
        let affected = connection
            .execute(
                &"CREATE TABLE sample (id INTEGER PRIMARY KEY, label TEXT, weight REAL, raw BLOB);
                INSERT INTO sample (label, weight, raw) VALUES ('a', 1.5, X'CAFE'), ('b', NULL, NULL);"
                    .into(),
            )
            .expect("Could not run the script");
        assert_eq!(affected.rows_affected, 2);
        assert_eq!(affected.last_affected_id, Some(2));
        assert_eq!(
            connection.last_insert_id(None).unwrap(),
            Value::Int64(Some(2))
        );
        assert!(connection.last_insert_id(Some("sample_seq")).is_err());

        let rows = connection
            .fetch(&"SELECT id, label, weight, raw FROM sample ORDER BY id;".into())
            .expect("Could not read the rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].names(), ["id", "label", "weight", "raw"]);
        assert_eq!(rows[0].get_column("label"), Some(&Value::Varchar(Some("a".into()))));
        assert_eq!(rows[0].get_column("weight"), Some(&Value::Float64(Some(1.5))));
        assert_eq!(
            rows[0].get_column("raw"),
            Some(&Value::Blob(Some([0xCA, 0xFE].into())))
        );
        assert!(rows[1].get_column("weight").unwrap().is_null());

        // Parameters
        let mut statement = rivet::Statement::new(
            "SELECT label FROM sample WHERE id IN (?, ?) AND label != ?;",
            vec![Value::Int64(Some(1)), Value::Int32(Some(2)), "b".into()],
        );
        let rows = connection.fetch(&statement).unwrap();
        assert_eq!(rows.len(), 1);
        silent_logs! {
            statement.parameters.pop();
            assert!(connection.fetch(&statement).is_err());
            statement.parameters.extend(["b".into(), "c".into()]);
            assert!(connection.fetch(&statement).is_err());
        }
    }

    #[test]
    fn offset_without_limit() {
        init_logs();
        let connection =
            Connection::open::<SqliteDriver>("sqlite://:memory:").expect("Could not open");
        connection
            .execute("CREATE TABLE n (v INTEGER); INSERT INTO n VALUES (1), (2), (3), (4);")
            .unwrap();
        let rows = connection
            .select("n", conditions! { "v >" => 1 })
            .unwrap()
            .offset(1)
            .rows()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values()[0], Value::Int64(Some(3)));
    }

    struct Badge;

    impl EntityType for Badge {
        fn definition() -> Definition {
            Definition::new("badge")
                .field("id", FieldSpec::new("integer").primary().sequence_named("badge_seq"))
                .field("holder", "string")
        }
    }

    #[test]
    fn failed_sequence_keeps_entity_new() {
        init_logs();
        let connection =
            Connection::open::<SqliteDriver>("sqlite://:memory:").expect("Could not open");
        connection
            .execute("CREATE TABLE badge (id INTEGER PRIMARY KEY, holder TEXT);")
            .unwrap();
        let badges = connection.mapper::<Badge>().unwrap();
        let badge = badges.entity(data! { "holder" => "Ada" }).unwrap();
        assert!(badge.is_new());
        silent_logs! {
            assert!(badges.insert(&badge).is_err());
        }
        assert!(badge.is_new());
        assert_eq!(badges.tracked(), 0);
    }
}
