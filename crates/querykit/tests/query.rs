use querykit::dialect::{Dialect, MsSql, MySql, Postgres, Sqlite};
use querykit::{Action, Condition, Query, Value, dialect_for_driver};

#[test]
fn count_switches_to_wrapped_form_once_grouped() {
    let q = Query::table("t").add_and("a", 1);
    assert_eq!(
        q.count_statement(None).unwrap().to_sql(),
        "SELECT count(0) FROM t WHERE a = ?"
    );

    let q = q.group_by("b");
    assert_eq!(
        q.count_statement(None).unwrap().to_sql(),
        "SELECT count(0) FROM (SELECT b FROM t WHERE a = ? GROUP BY b) a"
    );
}

#[test]
fn paged_query_counts_all_matching_rows() {
    let paged = Query::table("t")
        .add_and("a", 1)
        .order_by("b", None)
        .unwrap()
        .limit(10)
        .set_offset(20);

    assert_eq!(
        paged.count_statement(None).unwrap().to_sql(),
        "SELECT count(0) FROM t WHERE a = ?"
    );

    let dialects: [&dyn Dialect; 4] = [&Postgres, &MySql, &Sqlite, &MsSql];
    for dialect in dialects {
        let sql = paged.count_statement(Some(dialect)).unwrap().render(dialect);
        assert!(!sql.contains("LIMIT"), "{sql}");
        assert!(!sql.contains("TOP"), "{sql}");
        assert!(!sql.contains("ORDER BY"), "{sql}");
        assert!(sql.starts_with("SELECT count(0) FROM "), "{sql}");
    }

    let grouped = paged.group_by("a");
    assert_eq!(
        grouped.count_statement(None).unwrap().to_sql(),
        "SELECT count(0) FROM (SELECT a FROM t WHERE a = ? GROUP BY a LIMIT 20, 10) a"
    );
    assert_eq!(
        grouped.count_statement(Some(&Postgres)).unwrap().render(&Postgres),
        r#"SELECT count(0) FROM (SELECT "a" FROM "t" WHERE "a" = $1 GROUP BY "a" LIMIT 10 OFFSET 20) a"#
    );
    let mssql = grouped.count_statement(Some(&MsSql)).unwrap().render(&MsSql);
    assert!(mssql.starts_with("SELECT count(0) FROM (SELECT * FROM (SELECT ROW_NUMBER()"), "{mssql}");
    assert!(mssql.ends_with("WHERE [_row_num] > 20 AND [_row_num] <= 30 ORDER BY [_row_num]) a"), "{mssql}");
}

#[test]
fn names_outside_identifier_grammar_are_quoted_whole() {
    let stmt = Query::table("my-table").select_statement(Some(&Postgres)).unwrap();
    assert_eq!(stmt.render(&Postgres), r#"SELECT "my-table".* FROM "my-table""#);
}

#[test]
fn limit_round_trip_without_dialect() {
    let stmt = Query::table("t")
        .add_and("col", 5)
        .limit(10)
        .set_offset(20)
        .select_statement(None)
        .unwrap();

    let sql = stmt.to_sql();
    assert!(sql.ends_with("LIMIT 20, 10"), "{sql}");
    assert_eq!(sql.matches('?').count(), 1);
    assert_eq!(stmt.params(), &[Value::Int(5)]);
}

#[test]
fn clones_render_independently() {
    let base = Query::table("users").add_column("id").add_and("active", true);
    let select = base.clone().add_column("email");
    let delete = base.clone().set_action(Action::Delete);

    assert_eq!(
        select.build(None).unwrap().to_sql(),
        "SELECT id, email FROM users WHERE active = ?"
    );
    assert_eq!(
        delete.build(None).unwrap().to_sql(),
        "DELETE FROM users WHERE active = ?"
    );
    assert_eq!(base.columns().len(), 1);
    assert_eq!(base.action(), Action::Select);
}

#[test]
fn dialect_from_driver_name() {
    let q = Query::table("users")
        .add_and("id", 3)
        .order_by("id", Some("asc"))
        .unwrap()
        .limit(1);

    let pg = dialect_for_driver("pgsql").unwrap();
    let stmt = q.select_statement(Some(pg.as_ref())).unwrap();
    assert_eq!(
        stmt.render(pg.as_ref()),
        r#"SELECT "users".* FROM "users" WHERE "id" = $1 ORDER BY "id" ASC LIMIT 1"#
    );

    let stmt = q.select_statement(Some(&Sqlite)).unwrap();
    assert_eq!(
        stmt.render(&Sqlite),
        r#"SELECT "users".* FROM "users" WHERE "id" = ? ORDER BY "id" ASC LIMIT 1"#
    );

    assert!(dialect_for_driver("oracle").is_err());
}

#[test]
fn mssql_counts_without_limit_rewrite() {
    let stmt = Query::table("t")
        .set_distinct(true)
        .add_column("a")
        .count_statement(Some(&MsSql))
        .unwrap();
    assert_eq!(
        stmt.render(&MsSql),
        "SELECT count(0) FROM (SELECT DISTINCT [a] FROM [t]) a"
    );
}

#[test]
fn having_and_where_params_keep_order() {
    let mut having = Condition::new();
    having.and_greater("count(o.id)", 5);

    let stmt = Query::table("users u")
        .add_column("u.id")
        .add_column_as("count(o.id)", "orders")
        .left_join("orders o", "o.user_id = u.id")
        .unwrap()
        .add_and("u.active", true)
        .group_by("u.id")
        .set_having(having)
        .select_statement(Some(&Postgres))
        .unwrap();

    assert_eq!(
        stmt.render(&Postgres),
        r#"SELECT "u"."id", count(o.id) AS "orders" FROM "users" AS u LEFT JOIN "orders" AS o ON (o.user_id = u.id) WHERE "u"."active" = $1 GROUP BY "u"."id" HAVING count(o.id) > $2"#
    );
    assert_eq!(stmt.params(), &[Value::Bool(true), Value::Int(5)]);
}
