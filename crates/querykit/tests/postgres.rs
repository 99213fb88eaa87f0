//! Execution against a live PostgreSQL server.
//!
//! Set `DATABASE_URL` (a `.env` file is honored) to run these; they return early otherwise.

use futures_util::StreamExt;
use querykit::{Query, QueryError, QueryResult, SqlLogger};
use tokio_postgres::NoTls;

fn database_url(test: &str) -> Option<String> {
    let _ = dotenvy::dotenv();
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

async fn connect(url: &str) -> QueryResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });
    Ok(client)
}

async fn seed(client: &tokio_postgres::Client) -> QueryResult<()> {
    client
        .batch_execute(
            "CREATE TEMP TABLE qk_items (id int PRIMARY KEY, name text NOT NULL, qty int NOT NULL);
             INSERT INTO qk_items VALUES (1, 'apple', 3), (2, 'banana', 0), (3, 'cherry', 12);",
        )
        .await?;
    Ok(())
}

#[tokio::test]
async fn select_count_update_delete() -> QueryResult<()> {
    let Some(url) = database_url("select_count_update_delete") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    seed(&client).await?;
    let conn = SqlLogger::new().interpolate(true).wrap(client);

    let in_stock = Query::table("qk_items").and_greater("qty", 0);

    let rows = in_stock
        .clone()
        .order_by("id", Some("desc"))?
        .select(&conn)
        .await?;
    let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();
    assert_eq!(names, vec!["cherry", "apple"]);

    assert_eq!(in_stock.count(&conn).await?, 2);
    assert_eq!(in_stock.clone().group_by("qty").count(&conn).await?, 2);

    let updated = Query::table("qk_items")
        .add_and("id", 2)
        .update([("qty", 5)], &conn)
        .await?;
    assert_eq!(updated, 1);
    assert_eq!(in_stock.count(&conn).await?, 3);

    let deleted = Query::table("qk_items")
        .and_in("id", [1, 3])
        .delete(&conn)
        .await?;
    assert_eq!(deleted, 2);
    assert_eq!(Query::table("qk_items").count(&conn).await?, 1);
    Ok(())
}

#[tokio::test]
async fn select_stream_pages_rows() -> QueryResult<()> {
    let Some(url) = database_url("select_stream_pages_rows") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    seed(&client).await?;

    let mut stream = Query::table("qk_items")
        .order_by("id", None)?
        .limit(2)
        .set_offset(1)
        .select_stream(&client)
        .await?;

    let mut ids = Vec::new();
    while let Some(row) = stream.next().await {
        ids.push(row?.get::<_, i32>("id"));
    }
    assert_eq!(ids, vec![2, 3]);
    Ok(())
}

#[tokio::test]
async fn transaction_rolls_back_delete() -> QueryResult<()> {
    let Some(url) = database_url("transaction_rolls_back_delete") else {
        return Ok(());
    };
    let mut client = connect(&url).await?;
    seed(&client).await?;

    let tx = client.transaction().await?;
    assert_eq!(Query::table("qk_items").delete(&tx).await?, 3);
    assert_eq!(Query::table("qk_items").count(&tx).await?, 0);
    tx.rollback().await?;

    assert_eq!(Query::table("qk_items").count(&client).await?, 3);
    Ok(())
}

#[cfg(feature = "pool")]
#[tokio::test]
async fn registry_serves_default_connection() -> QueryResult<()> {
    use querykit::{ConnectionRegistry, RegistryConfig};

    if database_url("registry_serves_default_connection").is_none() {
        return Ok(());
    }
    let registry = ConnectionRegistry::from_config(RegistryConfig::from_env_var("DATABASE_URL")?)?;
    assert_eq!(registry.default_name().as_deref(), Some("default"));

    let total = Query::new()
        .set_table_as("(SELECT 1 AS n UNION ALL SELECT 2) AS v", "")
        .count_using(&registry)
        .await?;
    assert_eq!(total, 2);

    let err = Query::table("qk_missing_table")
        .count_using(&registry)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Query(_)));

    registry.clear();
    Ok(())
}
