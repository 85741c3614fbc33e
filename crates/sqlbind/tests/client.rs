use sqlbind::{
    Config, Database, ExecResult, FromRow, GenericClient, MutationQb, Postgres, RowSet, SqlQb,
    SqlResult, Value, qb,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Records every call and answers queries with a canned result set.
struct MockClient {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    rows: RowSet,
    delay: Option<Duration>,
}

impl MockClient {
    fn new(rows: RowSet) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rows,
            delay: None,
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
    }

    fn last_call(&self) -> (String, Vec<Value>) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

impl GenericClient for MockClient {
    async fn execute(&self, sql: &str, args: &[Value]) -> SqlResult<ExecResult> {
        self.record(sql, args);
        Ok(ExecResult::new(1))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> SqlResult<RowSet> {
        self.record(sql, args);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.rows.clone())
    }
}

fn pairs() -> RowSet {
    RowSet::new(["k", "v"])
        .with_row(vec![Value::Int(1), Value::from("x")])
        .unwrap()
        .with_row(vec![Value::Int(2), Value::from("y")])
        .unwrap()
}

#[derive(Debug, PartialEq, FromRow)]
struct Pair {
    k: i64,
    v: String,
}

#[tokio::test]
async fn fetch_map_binds_first_column_to_rest() -> SqlResult<()> {
    let client = MockClient::new(pairs());
    let map: HashMap<i64, String> = qb::select(["k", "v"])
        .from("t")
        .fetch_map(&client)
        .await?;

    assert_eq!(map, HashMap::from([(1, "x".to_string()), (2, "y".to_string())]));
    assert_eq!(client.last_call().0, "SELECT k, v FROM t");
    Ok(())
}

#[tokio::test]
async fn database_seeds_assemblers_with_its_dialect() -> SqlResult<()> {
    let db = Database::new(MockClient::new(pairs()), Config::with_dialect(Postgres));

    let rows: Vec<Pair> = db
        .select(["k", "v"])
        .from("t")
        .eq("k", 123)
        .fetch_all(&db)
        .await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        Pair {
            k: 1,
            v: "x".into()
        }
    );

    let (sql, args) = db.client().last_call();
    assert_eq!(sql, r#"SELECT "k", "v" FROM "t" WHERE "k"=$1"#);
    assert_eq!(args, vec![Value::Int(123)]);
    Ok(())
}

#[tokio::test]
async fn execute_mutations() -> SqlResult<()> {
    let db = Database::new(MockClient::new(RowSet::new(["id"])), Config::with_dialect(Postgres));

    let res = db.insert_into("t").values(["a", "b"]).execute(&db).await?;
    assert_eq!(res.rows_affected, 1);
    assert_eq!(db.client().last_call().0, r#"INSERT INTO "t" VALUES ($1, $2)"#);

    db.update("t").set("a", 1).eq("id", 2).execute(&db).await?;
    assert_eq!(db.client().last_call().0, r#"UPDATE "t" SET "a"=$1 WHERE "id"=$2"#);

    db.delete_from("t").eq("id", 2).execute(&db).await?;
    assert_eq!(db.client().last_call().0, r#"DELETE FROM "t" WHERE "id"=$1"#);

    let res = db.exec(&db.update("t").set("a", 3).is_null("b")).await?;
    assert_eq!(res.rows_affected, 1);
    assert_eq!(
        db.client().last_call(),
        (r#"UPDATE "t" SET "a"=$1 WHERE "b" IS NULL"#.to_string(), vec![Value::Int(3)])
    );
    Ok(())
}

#[tokio::test]
async fn fetch_one_without_rows_is_not_found() {
    let client = MockClient::new(RowSet::new(["id"]));
    let err = qb::select(["id"])
        .from("t")
        .fetch_one::<i64>(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let none: Option<i64> = qb::select(["id"]).from("t").fetch_opt(&client).await.unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn build_errors_never_reach_the_client() {
    let client = MockClient::new(RowSet::new(["id"]));
    let err = qb::select(["id"]).fetch_all::<i64>(&client).await.unwrap_err();
    assert!(err.is_build_error());
    assert!(client.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn database_helpers_and_sets() -> SqlResult<()> {
    let db = Database::new(MockClient::new(pairs()), Config::new());
    let qb = db.select(["k", "v"]).from("t");

    let first: Pair = db.fetch_one(&qb).await?;
    assert_eq!(first.k, 1);

    let keys: std::collections::HashSet<i64> = db.fetch_set(&qb, &["k"]).await?;
    assert_eq!(keys.len(), 2);

    let map: HashMap<i64, String> = db.fetch_map(&qb).await?;
    assert_eq!(map[&2], "y");
    Ok(())
}

#[tokio::test]
async fn query_timeout_maps_to_timeout_error() {
    let client = MockClient::new(pairs()).slow(Duration::from_secs(5));
    let db = Database::new(client, Config::new().timeout(Duration::from_millis(20)));

    let err = qb::select(["k"])
        .from("t")
        .fetch_all::<i64>(&db)
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn database_applies_configured_separator() -> SqlResult<()> {
    #[derive(Debug, FromRow)]
    struct Inner {
        n: i64,
    }

    #[derive(Debug, FromRow)]
    struct Outer {
        #[orm(flatten)]
        inner: Inner,
    }

    let rows = RowSet::new(["inner__n"])
        .with_row(vec![Value::Int(4)])
        .unwrap();
    let db = Database::new(MockClient::new(rows), Config::new().separator("__"));

    let out: Outer = db.fetch_one(&qb::select(["inner__n"]).from("t")).await?;
    assert_eq!(out.inner.n, 4);
    Ok(())
}
