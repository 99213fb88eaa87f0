use querykit::dialect::{MySql, Postgres};
use querykit::{Join, JoinOn, JoinType, Query};

#[test]
fn shorthand_join_infers_table() {
    let q = Query::table("foo").join("foo.bar_id", "foo2.bar_id").unwrap();
    let join = &q.joins()[0];
    assert_eq!(
        join.to_statement(Some(&MySql)).unwrap().render(&MySql),
        "JOIN `foo2` ON (`foo`.`bar_id` = `foo2`.`bar_id`)"
    );

    let aliased = join.clone().with_alias("f");
    assert_eq!(
        aliased.to_statement(Some(&MySql)).unwrap().render(&MySql),
        "JOIN `foo2` AS f ON (`foo`.`bar_id` = `foo2`.`bar_id`)"
    );
}

#[test]
fn join_once_deduplicates_by_table_and_alias() {
    let q = Query::table("foo")
        .join_once("foo.bar_id", "foo2.bar_id", JoinType::Inner)
        .unwrap()
        .join_once("foo.bar_id", "foo2.bar_id", JoinType::Inner)
        .unwrap();
    assert_eq!(q.joins().len(), 1);

    let q = Query::table("foo")
        .left_join_once("foo2 a", "foo.id = a.foo_id")
        .unwrap()
        .left_join_once("foo2 a", "foo.id = a.foo_id")
        .unwrap()
        .left_join_once("foo2 b", "foo.id = b.foo_id")
        .unwrap();
    assert_eq!(q.joins().len(), 2);
}

#[test]
fn join_spec_once_compares_target_and_alias() {
    let join = Join::create("tags t", "t.post_id = posts.id", JoinType::Left).unwrap();
    let q = Query::table("posts")
        .join_spec_once(join.clone())
        .join_spec_once(join.with_alias("t2"));
    assert_eq!(q.joins().len(), 2);
}

#[test]
fn joined_subquery_renders_parenthesized() {
    let latest = Query::table("orders")
        .add_column("user_id")
        .add_column_as("max(created_at)", "last_order")
        .group_by("user_id");
    let join = Join::subquery(latest, "lo", "lo.user_id = u.id", JoinType::Left).unwrap();

    let stmt = Query::table("users u")
        .add_join_spec(join)
        .select_statement(Some(&Postgres))
        .unwrap();
    assert_eq!(
        stmt.render(&Postgres),
        r#"SELECT u.* FROM "users" AS u LEFT JOIN (SELECT "user_id", max(created_at) AS "last_order" FROM "orders" GROUP BY "user_id") AS lo ON (lo.user_id = u.id)"#
    );
}

#[test]
fn outer_join_without_on_is_always_true() {
    let stmt = Query::table("a")
        .outer_join("b", None::<JoinOn>)
        .unwrap()
        .select_statement(None)
        .unwrap();
    assert_eq!(stmt.to_sql(), "SELECT a.* FROM a OUTER JOIN b ON (1 = 1)");
}
