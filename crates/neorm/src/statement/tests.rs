use super::*;

fn pg() -> Statement {
    Statement::new(Dialect::Postgres)
}

fn mysql() -> Statement {
    Statement::new(Dialect::MySql)
}

#[test]
fn select_where_uses_dialect_placeholder() {
    for dialect in Dialect::ALL {
        let mut q = Statement::new(dialect);
        q.select(["a", "b"])
            .unwrap()
            .table("t")
            .where_("a", "=", 1)
            .unwrap()
            .finish();

        let expected = format!("SELECT a, b FROM t WHERE a = {};", dialect.placeholder(1));
        assert_eq!(q.sql(), expected);
        assert_eq!(q.args(), &[Value::Int(1)]);
        assert_eq!(q.kind(), StatementKind::Select);
    }
}

#[test]
fn numbered_placeholders_follow_append_order() {
    let mut q = pg();
    q.select("*")
        .unwrap()
        .table("users")
        .where_("status", "=", "active")
        .unwrap()
        .and("age", ">", 18)
        .unwrap()
        .in_(Clause::And, "role", ["admin", "owner"]);

    assert_eq!(
        q.sql(),
        "SELECT * FROM users WHERE status = $1 AND age > $2 AND role IN($3, $4)"
    );
    assert_eq!(q.args().len(), 4);
}

#[test]
fn sqlserver_placeholders() {
    let mut q = Statement::new(Dialect::SqlServer);
    q.delete()
        .table("users")
        .where_("id", "=", 1)
        .unwrap()
        .or("id", "=", 2)
        .unwrap();
    assert_eq!(q.sql(), "DELETE FROM users WHERE id = @p1 OR id = @p2");
}

#[test]
fn null_comparisons() {
    let mut q = pg();
    q.select("*")
        .unwrap()
        .table("t")
        .where_("deleted_at", "=", Value::Null)
        .unwrap()
        .or("archived_at", "!=", None::<i32>)
        .unwrap()
        .and("owner", "<>", Value::Null)
        .unwrap();

    assert_eq!(
        q.sql(),
        "SELECT * FROM t WHERE deleted_at IS NULL OR archived_at IS NOT NULL AND owner IS NOT NULL"
    );
    assert!(q.args().is_empty());

    let err = q.where_("x", ">", Value::Null).unwrap_err();
    assert!(err.is_usage());
}

#[test]
fn select_rejects_bad_column_sets() {
    assert!(pg().select(["*", "a"]).unwrap_err().is_usage());
    assert!(pg().select("id").unwrap_err().is_usage());
    assert!(pg().select(Vec::<&str>::new()).unwrap_err().is_usage());

    let mut q = pg();
    q.select(["*"]).unwrap();
    assert_eq!(q.sql(), "SELECT * FROM");
}

#[test]
fn new_statement_resets_previous_arguments() {
    let mut q = pg();
    q.select("*").unwrap().table("t").where_("a", "=", 1).unwrap();
    q.select(["b"]).unwrap().table("t").where_("b", "=", 2).unwrap();

    assert_eq!(q.sql(), "SELECT b FROM t WHERE b = $1");
    assert_eq!(q.args(), &[Value::Int(2)]);
}

#[test]
fn insert_splices_table_after_into() {
    let mut q = mysql();
    q.insert(["name", "age"], [Value::from("bob"), Value::from(30)])
        .unwrap()
        .table("users")
        .finish();
    assert_eq!(q.sql(), "INSERT INTO users (name, age) VALUES (?, ?);");
    assert_eq!(q.kind(), StatementKind::Insert);

    let mut q = pg();
    q.insert(vec!["a"], vec![1]).unwrap().table("t").finish();
    assert_eq!(q.sql(), "INSERT INTO t (a) VALUES ($1);");
}

#[test]
fn insert_validates_shape() {
    let err = pg().insert(["a", "b"], [1]).unwrap_err();
    assert!(err.is_usage());

    let err = pg()
        .insert(Vec::<&str>::new(), Vec::<Value>::new())
        .unwrap_err();
    assert!(err.is_usage());
}

#[test]
fn update_set_chain() {
    let mut q = pg();
    q.update()
        .table("users")
        .set("name", "bob")
        .set("nickname", Value::Null)
        .where_("id", "=", 7)
        .unwrap()
        .finish();

    assert_eq!(
        q.sql(),
        "UPDATE users SET name = $1, nickname = NULL WHERE id = $2;"
    );
    assert_eq!(q.args(), &[Value::from("bob"), Value::Int(7)]);
    assert_eq!(q.kind(), StatementKind::Mutation);
}

#[test]
fn parenthesized_groups() {
    let mut q = pg();
    q.select("*")
        .unwrap()
        .table("t")
        .where_("a", "=", 1)
        .unwrap()
        .open_parenthesis(Clause::And)
        .and("b", "=", 2)
        .unwrap()
        .or("c", "=", 3)
        .unwrap()
        .close_parenthesis()
        .unwrap();
    assert_eq!(
        q.sql(),
        "SELECT * FROM t WHERE a = $1 AND (b = $2 OR c = $3)"
    );
    assert_eq!(q.open_groups(), 0);

    let mut q = mysql();
    q.select("*")
        .unwrap()
        .table("t")
        .open_parenthesis("where".parse().unwrap())
        .where_("a", "=", 1)
        .unwrap()
        .or("b", "=", Value::Null)
        .unwrap()
        .close_parenthesis()
        .unwrap();
    assert_eq!(q.sql(), "SELECT * FROM t WHERE (a = ? OR b IS NULL)");
}

#[test]
fn unbalanced_parenthesis_is_rejected() {
    let mut q = pg();
    q.select("*").unwrap().table("t");
    assert!(q.close_parenthesis().unwrap_err().is_usage());

    assert!("having".parse::<Clause>().unwrap_err().is_usage());
    assert_eq!(" Or ".parse::<Clause>().unwrap(), Clause::Or);
}

#[test]
fn empty_membership_list_stays_valid() {
    let mut q = pg();
    q.select("*")
        .unwrap()
        .table("t")
        .not_in(Clause::Where, "id", Vec::<i64>::new());
    assert_eq!(q.sql(), "SELECT * FROM t WHERE id NOT IN(NULL)");
    assert!(q.args().is_empty());
}

#[test]
fn like_binds_wrapped_pattern() {
    let mut q = mysql();
    q.select("*")
        .unwrap()
        .table("users")
        .like(["name", "email"], "bob");
    assert_eq!(
        q.sql(),
        "SELECT * FROM users WHERE name LIKE ? OR email LIKE ?"
    );
    assert_eq!(q.args(), &[Value::from("%bob%"), Value::from("%bob%")]);
}

#[test]
fn joins_ordering_and_paging() {
    let mut q = pg();
    q.select(["u.id", "o.total"])
        .unwrap()
        .table("users u")
        .inner_join("orders o", "u.id", "=", "o.user_id")
        .left_join("addresses a", "a.user_id", "=", "u.id")
        .right_join("teams t", "t.id", "=", "u.team_id")
        .order_by("o.total", "desc")
        .unwrap()
        .limit(10)
        .offset(20)
        .finish();

    assert_eq!(
        q.sql(),
        "SELECT u.id, o.total FROM users u \
         INNER JOIN orders o ON u.id = o.user_id \
         LEFT JOIN addresses a ON a.user_id = u.id \
         RIGHT JOIN teams t ON t.id = u.team_id \
         ORDER BY o.total DESC LIMIT 10 OFFSET 20;"
    );

    let mut q = pg();
    q.select("*").unwrap().table("a").natural_join("b").cross_join("c");
    assert_eq!(q.sql(), "SELECT * FROM a NATURAL JOIN b CROSS JOIN c");
}

#[test]
fn order_by_rejects_unknown_direction() {
    let mut q = pg();
    q.select("*").unwrap().table("t");
    assert!(q.order_by("id", "sideways").unwrap_err().is_usage());
}

#[test]
fn order_by_field_and_random() {
    let mut q = mysql();
    q.select("*")
        .unwrap()
        .table("t")
        .order_by_field("status", ["new", "open"]);
    assert_eq!(q.sql(), "SELECT * FROM t ORDER BY FIELD(status, ?, ?)");
    assert_eq!(q.args().len(), 2);

    let mut q = mysql();
    q.select("*").unwrap().table("t").order_random();
    assert_eq!(q.sql(), "SELECT * FROM t ORDER BY RAND()");

    let mut q = pg();
    q.select("*").unwrap().table("t").order_random();
    assert_eq!(q.sql(), "SELECT * FROM t ORDER BY RANDOM()");
}

#[test]
fn count_accepts_predicates() {
    let mut q = mysql();
    q.count("users").where_("active", "=", true).unwrap().finish();
    assert_eq!(
        q.sql(),
        "SELECT COUNT(*) AS length FROM users WHERE active = ?;"
    );
    assert_eq!(q.kind(), StatementKind::Count);
    assert_eq!(q.table_name(), Some("users"));
}

#[test]
fn call_with_and_without_alias() {
    let mut q = pg();
    q.call("add_numbers", "@result", [1, 2]).finish();
    assert_eq!(q.sql(), "CALL add_numbers($1, $2);");
    assert_eq!(q.result_alias(), Some("@result"));
    assert_eq!(q.kind(), StatementKind::Call);

    let mut q = pg();
    q.call("refresh", "", Vec::<Value>::new());
    assert_eq!(q.sql(), "CALL refresh()");
    assert_eq!(q.result_alias(), None);
}

#[test]
fn custom_query_with_manual_binds() {
    let mut q = pg();
    q.custom_query("SELECT * FROM t WHERE a = $1")
        .bind(5)
        .finish();
    assert_eq!(q.sql(), "SELECT * FROM t WHERE a = $1;");
    assert_eq!(q.args(), &[Value::Int(5)]);
    assert_eq!(q.kind(), StatementKind::Raw);
}

#[test]
fn finish_is_idempotent() {
    let mut q = pg();
    q.select("*").unwrap().table("t").finish().finish();
    assert_eq!(q.sql(), "SELECT * FROM t;");
    assert!(q.is_finished());
}

#[test]
fn results_before_execution_are_sentinels() {
    let q = pg();
    assert!(q.rows().is_empty());
    assert_eq!(q.length(), -1);
    assert_eq!(q.last_insert_id().unwrap(), -1);
    assert_eq!(q.rows_affected().unwrap(), -1);
}

#[test]
fn create_table_closes_column_list() {
    let mut q = mysql();
    q.create_table("users")
        .if_not_exists()
        .unwrap()
        .add_column("id")
        .type_("int")
        .auto_increment()
        .primary_key()
        .unwrap()
        .add_column("name")
        .type_("varchar(255)")
        .not_null()
        .default("anon")
        .unwrap()
        .finish();

    assert_eq!(
        q.sql(),
        "CREATE TABLE IF NOT EXISTS users (id INT AUTO_INCREMENT PRIMARY KEY, \
         name VARCHAR(255) NOT NULL DEFAULT 'anon');"
    );
    assert_eq!(q.kind(), StatementKind::Schema);
}

#[test]
fn table_constraints_and_engine() {
    let mut q = mysql();
    q.create_table("orders")
        .add_column("id")
        .type_("INT")
        .add_column("user_id")
        .type_("INT")
        .foreign_key("user_id", "users", "id")
        .on_delete("CASCADE")
        .index(["user_id"])
        .unwrap()
        .engine("InnoDB")
        .finish();

    assert_eq!(
        q.sql(),
        "CREATE TABLE orders (id INT, user_id INT, \
         FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE, \
         INDEX (user_id)) ENGINE = InnoDB;"
    );
}

#[test]
fn enum_and_comment_are_quoted() {
    let mut q = mysql();
    q.create_table("t")
        .add_column("status")
        .enum_(["new", "done"])
        .comment("it's the state")
        .finish();
    assert_eq!(
        q.sql(),
        "CREATE TABLE t (status ENUM('new', 'done') COMMENT 'it''s the state');"
    );
}

#[test]
fn default_checks_declared_type() {
    let mut q = mysql();
    q.create_table("t").add_column("n").type_("INT");
    assert!(q.default("abc").unwrap_err().is_usage());
    assert!(q.default(Value::Null).unwrap_err().is_usage());
    q.default(5).unwrap();
    assert!(q.sql().ends_with("n INT DEFAULT 5"));

    let mut q = mysql();
    q.create_table("t").add_column("flag").type_("BOOLEAN");
    assert!(q.default(2).unwrap_err().is_usage());
    q.default(true).unwrap();
    assert!(q.sql().ends_with("flag BOOLEAN DEFAULT true"));

    let mut q = mysql();
    q.create_table("t").add_column("created").type_("TIMESTAMP");
    assert!(q.default(0).unwrap_err().is_usage());
    q.default("CURRENT_TIMESTAMP").unwrap();
    assert!(q.sql().ends_with("created TIMESTAMP DEFAULT CURRENT_TIMESTAMP"));

    let mut q = mysql();
    q.create_table("t").add_column("price").type_("DECIMAL(10,2)");
    q.default(1.5).unwrap();
    assert!(q.sql().ends_with("price DECIMAL(10,2) DEFAULT 1.5"));
}

#[test]
fn text_family_defaults_must_be_strings() {
    for ty in ["VARCHAR(20)", "CHAR", "TEXT", "LONGTEXT", "BINARY(16)", "VARBINARY(255)"] {
        let mut q = mysql();
        q.create_table("t").add_column("c").type_(ty);
        assert!(q.default(5).unwrap_err().is_usage(), "{ty} accepted an integer");
        assert!(q.default(true).unwrap_err().is_usage(), "{ty} accepted a boolean");
        assert!(q.default(1.5).unwrap_err().is_usage(), "{ty} accepted a float");
        q.default("x").unwrap();
        assert!(q.sql().ends_with(" DEFAULT 'x'"), "{}", q.sql());
    }
}

#[test]
fn structured_defaults_render_as_json() {
    let mut q = mysql();
    q.create_table("t").add_column("meta").type_("VARCHAR(255)");
    q.default(serde_json::json!({ "tier": "o'neil" })).unwrap();
    assert!(q.sql().ends_with(r#"meta VARCHAR(255) DEFAULT '{"tier":"o''neil"}'"#));

    let mut q = mysql();
    q.create_table("t").add_column("created").type_("DATETIME");
    q.default(serde_json::json!("CURRENT_TIMESTAMP")).unwrap();
    assert!(q.sql().ends_with("created DATETIME DEFAULT CURRENT_TIMESTAMP"));

    let mut q = mysql();
    q.create_table("t").add_column("n").type_("BIGINT");
    assert!(q.default(serde_json::json!(5)).unwrap_err().is_usage());
}

#[test]
fn wide_integers_bind_as_arguments() {
    let mut q = pg();
    q.select("*")
        .unwrap()
        .table("t")
        .where_("id", "=", 9_usize)
        .unwrap()
        .and("big", "=", u64::MAX)
        .unwrap()
        .finish();
    assert_eq!(q.sql(), "SELECT * FROM t WHERE id = $1 AND big = $2;");
    assert_eq!(
        q.args(),
        &[Value::Int(9), Value::Text("18446744073709551615".into())]
    );
}

#[test]
fn default_without_type_is_rejected() {
    let mut q = mysql();
    q.create_table("t").add_column("n");
    assert!(q.default(1).unwrap_err().is_usage());
}

#[test]
fn second_primary_key_is_rejected() {
    let mut q = mysql();
    q.create_table("t")
        .add_column("a")
        .type_("INT")
        .primary_key()
        .unwrap()
        .add_column("b")
        .type_("INT");
    assert!(q.primary_key().unwrap_err().is_usage());
    assert!(q.add_primary_key("b").unwrap_err().is_usage());
}

#[test]
fn alter_table_chain() {
    let mut q = mysql();
    q.alter_table("users")
        .add_column("age")
        .type_("INT")
        .default(0)
        .unwrap()
        .after("name")
        .finish();
    assert_eq!(q.sql(), "ALTER TABLE users ADD COLUMN age INT DEFAULT 0 AFTER name;");

    let mut q = mysql();
    q.alter_table("orders")
        .foreign_key_with_constraint("fk_user", "user_id", "users", "id")
        .finish();
    assert_eq!(
        q.sql(),
        "ALTER TABLE orders ADD CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES users(id);"
    );

    let mut q = mysql();
    q.alter_table("users")
        .rename_column("name", "full_name")
        .drop_index("idx_old")
        .add_unique_index("idx_email", "email")
        .finish();
    assert_eq!(
        q.sql(),
        "ALTER TABLE users RENAME COLUMN name TO full_name DROP INDEX idx_old \
         ADD UNIQUE INDEX idx_email (email);"
    );

    let mut q = mysql();
    q.alter_table("logs").modify_column("level").type_("TINYINT").first().finish();
    assert_eq!(q.sql(), "ALTER TABLE logs MODIFY COLUMN level TINYINT FIRST;");
}

#[test]
fn if_not_exists_placement() {
    let mut q = mysql();
    q.create_schema("shop").if_not_exists().unwrap().finish();
    assert_eq!(q.sql(), "CREATE DATABASE IF NOT EXISTS shop;");
    assert_eq!(q.schema(), Some("shop"));

    let mut q = mysql();
    q.alter_table("t");
    assert!(q.if_not_exists().unwrap_err().is_usage());
}

#[test]
fn create_user_and_grant() {
    let mut q = mysql();
    q.create_user("bob", "localhost").identified_by("s3cr'et").finish();
    assert_eq!(
        q.sql(),
        "CREATE USER 'bob'@'localhost' IDENTIFIED BY 's3cr''et';"
    );

    q.grant_privileges("select insert", "shop.*").unwrap();
    assert_eq!(q.sql(), "GRANT SELECT, INSERT ON shop.* TO 'bob'@'localhost'");

    q.grant_privileges("all", "shop.*").unwrap();
    assert_eq!(q.sql(), "GRANT ALL PRIVILEGES ON shop.* TO 'bob'@'localhost'");

    q.revoke_privileges(vec!["update", "grant option"], "shop.*")
        .unwrap();
    assert_eq!(
        q.sql(),
        "REVOKE UPDATE, GRANT OPTION ON shop.* FROM 'bob'@'localhost'"
    );
}

#[test]
fn grant_option_in_free_text() {
    let mut q = mysql();
    q.for_user("ann", "%");
    q.grant_privileges("SELECT grant option", "db.*").unwrap();
    assert_eq!(q.sql(), "GRANT SELECT, GRANT OPTION ON db.* TO 'ann'@'%'");
}

#[test]
fn unsupported_privilege_is_config_error() {
    let mut q = mysql();
    q.for_user("bob", "localhost");
    let err = q.grant_privileges("select truncate", "shop.*").unwrap_err();
    assert!(err.is_config());
}

#[test]
fn user_operations_need_a_user() {
    let mut q = mysql();
    assert!(q.grant_privileges(Privileges::All, "db.*").unwrap_err().is_usage());
    assert!(q.show_grants().unwrap_err().is_usage());
    assert!(q.set_password("x").unwrap_err().is_usage());
}

#[test]
fn rename_user_moves_the_context() {
    let mut q = mysql();
    q.for_user("bob", "localhost");
    q.rename_user("robert", "%").unwrap();
    assert_eq!(q.sql(), "RENAME USER 'bob'@'localhost' TO 'robert'@'%'");

    q.show_grants().unwrap();
    assert_eq!(q.sql(), "SHOW GRANTS FOR 'robert'@'%'");
    assert_eq!(q.kind(), StatementKind::Select);

    q.set_default_role("reader").unwrap();
    assert_eq!(q.sql(), "SET DEFAULT ROLE 'reader' FOR 'robert'@'%'");
}

#[test]
fn account_statements() {
    let mut q = mysql();
    q.lock_user_account("bob", "localhost");
    assert_eq!(q.sql(), "ALTER USER 'bob'@'localhost' ACCOUNT LOCK");

    q.password_expiration("bob", "localhost", "INTERVAL 90 DAY");
    assert_eq!(
        q.sql(),
        "ALTER USER 'bob'@'localhost' PASSWORD EXPIRE INTERVAL 90 DAY"
    );

    q.drop_user("bob", "localhost");
    assert_eq!(q.sql(), "DROP USER 'bob'@'localhost'");

    q.all_users();
    assert_eq!(q.sql(), "SELECT user, host FROM mysql.user");

    q.flush_privileges().finish();
    assert_eq!(q.sql(), "FLUSH PRIVILEGES;");
}
