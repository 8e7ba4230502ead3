use policy_adapter::{Adapter, AdapterError, PolicyModel, RuleFilter, SqliteAdapter};
use rusqlite::limits::Limit;
use rusqlite::Connection;

fn rule(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn loaded(adapter: &SqliteAdapter<'_>) -> PolicyModel {
    let mut model = PolicyModel::rbac();
    adapter.load_policy(&mut model).unwrap();
    model
}

fn insert_row(conn: &Connection, fields: [&str; 7]) {
    conn.execute(
        "INSERT INTO casbin_rule (ptype, v0, v1, v2, v3, v4, v5)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        fields,
    )
    .unwrap();
}

fn sample_model() -> PolicyModel {
    let mut model = PolicyModel::rbac();
    model.define("p2");
    model.add_rule("p", "p", rule(&["alice", "data1", "read"]));
    model.add_rule("p", "p", rule(&["bob", "data2", "write"]));
    model.add_rule("p", "p", rule(&["data2_admin", "data2", "read"]));
    model.add_rule("p", "p2", rule(&["carol", "data3", "read", "allow"]));
    model.add_rule("g", "g", rule(&["alice", "data2_admin"]));
    model
}

#[test]
fn save_then_load_roundtrips_model() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    let model = sample_model();

    adapter.save_policy(&model).unwrap();

    let mut reloaded = PolicyModel::rbac();
    reloaded.define("p2");
    adapter.load_policy(&mut reloaded).unwrap();
    assert_eq!(reloaded, model);
    assert_eq!(adapter.rule_count().unwrap(), 5);
}

#[test]
fn save_replaces_previous_content() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    adapter
        .add_policy("p", "p", &rule(&["mallory", "secrets", "read"]))
        .unwrap();

    let mut model = PolicyModel::rbac();
    model.add_rule("g", "g", rule(&["alice", "admin"]));
    adapter.save_policy(&model).unwrap();

    let reloaded = loaded(&adapter);
    assert!(reloaded.rules("p", "p").is_empty());
    assert_eq!(reloaded.rules("g", "g"), [rule(&["alice", "admin"])]);
}

#[test]
fn save_writes_p_section_before_g_section() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    adapter.save_policy(&sample_model()).unwrap();

    let mut stmt = conn
        .prepare("SELECT ptype FROM casbin_rule ORDER BY rowid;")
        .unwrap();
    let ptypes: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ptypes, ["p", "p", "p", "p2", "g"]);
}

#[test]
fn save_stores_unused_fields_as_empty_strings() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    let mut model = PolicyModel::rbac();
    model.add_rule("g", "g", rule(&["alice", "admin"]));
    adapter.save_policy(&model).unwrap();

    let nulls: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM casbin_rule WHERE v2 IS NULL OR v5 IS NULL;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let empties: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM casbin_rule WHERE v2 = '' AND v5 = '';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(nulls, 0);
    assert_eq!(empties, 1);
}

#[test]
fn failed_save_rolls_back_to_previous_rules() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    adapter
        .add_policy("p", "p", &rule(&["alice", "data1", "read"]))
        .unwrap();

    // The `g` rule is written after every `p` rule and exceeds the row limit.
    let previous = conn.set_limit(Limit::SQLITE_LIMIT_LENGTH, 1024);
    assert!(previous > 4096);
    assert_eq!(conn.limit(Limit::SQLITE_LIMIT_LENGTH), 1024);
    let oversized = "x".repeat(4096);
    let mut model = sample_model();
    model.add_rule("g", "g", rule(&["bob", oversized.as_str()]));

    let err = adapter.save_policy(&model).unwrap_err();
    assert!(matches!(err, AdapterError::Storage(_)));

    let reloaded = loaded(&adapter);
    assert_eq!(reloaded.rules("p", "p"), [rule(&["alice", "data1", "read"])]);
    assert_eq!(reloaded.rule_count(), 1);
}

#[test]
fn add_policy_is_visible_on_load() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();

    adapter
        .add_policy("p", "p", &rule(&["alice", "data1", "read"]))
        .unwrap();

    let model = loaded(&adapter);
    assert_eq!(model.rules("p", "p"), [rule(&["alice", "data1", "read"])]);
    assert_eq!(model.rule_count(), 1);
}

#[test]
fn add_policy_keeps_duplicates() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    let alice = rule(&["alice", "data1", "read"]);

    adapter.add_policy("p", "p", &alice).unwrap();
    adapter.add_policy("p", "p", &alice).unwrap();

    assert_eq!(adapter.rule_count().unwrap(), 2);
    assert_eq!(loaded(&adapter).rules("p", "p"), [alice.clone(), alice]);
}

#[test]
fn add_policy_drops_parameters_beyond_six() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();

    adapter
        .add_policy("p", "p", &rule(&["a", "b", "c", "d", "e", "f", "g"]))
        .unwrap();

    assert_eq!(
        loaded(&adapter).rules("p", "p"),
        [rule(&["a", "b", "c", "d", "e", "f"])]
    );
}

#[test]
fn load_preserves_insertion_order() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    for subject in ["zoe", "adam", "mia"] {
        adapter
            .add_policy("p", "p", &rule(&[subject, "data1", "read"]))
            .unwrap();
    }

    let subjects: Vec<_> = loaded(&adapter)
        .rules("p", "p")
        .iter()
        .map(|rule| rule[0].clone())
        .collect();
    assert_eq!(subjects, ["zoe", "adam", "mia"]);
}

#[test]
fn load_skips_rule_types_the_model_does_not_define() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    adapter
        .add_policy("p", "p", &rule(&["alice", "data1", "read"]))
        .unwrap();
    adapter
        .add_policy("g", "g2", &rule(&["alice", "domain1"]))
        .unwrap();

    let model = loaded(&adapter);
    assert_eq!(model.rule_count(), 1);
    assert!(!model.is_defined("g", "g2"));
}

#[test]
fn load_handles_values_containing_commas() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    let tricky = rule(&["alice", "/data/a,b", "read"]);
    adapter.add_policy("p", "p", &tricky).unwrap();

    assert_eq!(loaded(&adapter).rules("p", "p"), [tricky]);
}

#[test]
fn load_filtered_policy_only_loads_matching_rows() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    adapter.save_policy(&sample_model()).unwrap();

    let mut model = PolicyModel::rbac();
    let filter = RuleFilter::for_ptype("p").with_field(1, "data2");
    adapter.load_filtered_policy(&mut model, &filter).unwrap();

    assert_eq!(
        model.rules("p", "p"),
        [
            rule(&["bob", "data2", "write"]),
            rule(&["data2_admin", "data2", "read"])
        ]
    );
    assert!(model.rules("g", "g").is_empty());
}

#[test]
fn remove_policy_deletes_only_exact_match() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    insert_row(&conn, ["p", "alice", "data1", "read", "", "", ""]);
    insert_row(&conn, ["p", "bob", "data2", "write", "", "", ""]);

    adapter
        .remove_policy("p", "p", &rule(&["alice", "data1", "read"]))
        .unwrap();

    assert_eq!(
        loaded(&adapter).rules("p", "p"),
        [rule(&["bob", "data2", "write"])]
    );
}

#[test]
fn remove_policy_with_empty_parameter_matches_any_value_in_that_field() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    insert_row(&conn, ["p", "alice", "", "read", "", "", ""]);
    insert_row(&conn, ["p", "alice", "data9", "read", "", "", ""]);
    insert_row(&conn, ["p", "alice", "data9", "write", "", "", ""]);

    adapter
        .remove_policy("p", "p", &rule(&["alice", "", "read"]))
        .unwrap();

    // Both "read" rows go, including the one whose v1 is "data9".
    assert_eq!(
        loaded(&adapter).rules("p", "p"),
        [rule(&["alice", "data9", "write"])]
    );
}

#[test]
fn remove_policy_without_match_is_not_an_error() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    insert_row(&conn, ["p", "alice", "data1", "read", "", "", ""]);

    adapter
        .remove_policy("p", "p", &rule(&["nobody", "data1", "read"]))
        .unwrap();

    assert_eq!(adapter.rule_count().unwrap(), 1);
}

#[test]
fn remove_policy_ignores_section_and_respects_ptype() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    insert_row(&conn, ["p", "alice", "admin", "", "", "", ""]);
    insert_row(&conn, ["g", "alice", "admin", "", "", "", ""]);

    adapter
        .remove_policy("g", "g", &rule(&["alice", "admin"]))
        .unwrap();

    let model = loaded(&adapter);
    assert!(model.rules("g", "g").is_empty());
    assert_eq!(model.rules("p", "p"), [rule(&["alice", "admin"])]);
}

#[test]
fn remove_filtered_policy_constrains_from_field_index() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    insert_row(&conn, ["p", "alice", "data1", "read", "", "", ""]);
    insert_row(&conn, ["p", "bob", "data1", "write", "", "", ""]);
    insert_row(&conn, ["p", "alice", "data2", "read", "", "", ""]);

    adapter
        .remove_filtered_policy("p", "p", 1, &rule(&["data1"]))
        .unwrap();

    assert_eq!(
        loaded(&adapter).rules("p", "p"),
        [rule(&["alice", "data2", "read"])]
    );
}

#[test]
fn remove_filtered_policy_skips_empty_values() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    insert_row(&conn, ["p", "alice", "data1", "read", "", "", ""]);
    insert_row(&conn, ["p", "bob", "data2", "read", "", "", ""]);
    insert_row(&conn, ["p", "bob", "data2", "write", "", "", ""]);

    adapter
        .remove_filtered_policy("p", "p", 0, &rule(&["", "", "read"]))
        .unwrap();

    assert_eq!(
        loaded(&adapter).rules("p", "p"),
        [rule(&["bob", "data2", "write"])]
    );
}

#[test]
fn remove_filtered_policy_without_constraints_clears_ptype() {
    let conn = Connection::open_in_memory().unwrap();
    let adapter = SqliteAdapter::open(&conn).unwrap();
    insert_row(&conn, ["p", "alice", "data1", "read", "", "", ""]);
    insert_row(&conn, ["g", "alice", "admin", "", "", "", ""]);

    adapter.remove_filtered_policy("p", "p", 6, &rule(&["x"])).unwrap();

    let model = loaded(&adapter);
    assert!(model.rules("p", "p").is_empty());
    assert_eq!(model.rules("g", "g"), [rule(&["alice", "admin"])]);
}
