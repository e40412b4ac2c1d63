use async_trait::async_trait;
use chrono::NaiveDate;
use tabula::execute::{
    CancellationToken, ExecutionError, MemoryRowSource, ReportExecutor, RowSource, RowSourceError,
};
use tabula::model::{
    ChartKind, DateRange, FieldType, FilterValue, Operator, OrderBy, ReportConfig, ReportField,
    ReportFilter, ReportKind, Row, Value,
};
use tabula::registry::FieldRegistry;
use tabula::shape::{ReportResult, ShapeError};
use tabula::validate::validate;

fn registry() -> FieldRegistry {
    FieldRegistry::new(vec![
        ReportField::new("product.category", "products", "Category", FieldType::Enum),
        ReportField::new("product.name", "products", "Product Name", FieldType::Text),
        ReportField::new("order.revenue", "orders", "Revenue", FieldType::Number),
        ReportField::new("order.price", "orders", "Price", FieldType::Number),
        ReportField::new("order.date", "orders", "Order Date", FieldType::Date),
        ReportField::new("order.status", "orders", "Status", FieldType::Enum),
    ])
    .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn run(config: &ReportConfig, rows: Vec<Row>) -> Result<ReportResult, ExecutionError> {
    let validated = validate(config, &registry()).expect("config should validate");
    let source = MemoryRowSource::new(rows);
    ReportExecutor::new()
        .execute(&validated, &source, &CancellationToken::new())
        .await
}

fn table_rows(result: &ReportResult) -> &[Row] {
    match result {
        ReportResult::Table { rows, .. } => rows,
        other => panic!("expected a table result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_grouping_collapses_to_counts() {
    // Electronics appears twice, Furniture once; revenue collapses to a
    // per-category count.
    let config = ReportConfig::new("By category", ReportKind::Table)
        .with_fields(["product.category", "order.revenue"])
        .with_group_by(["product.category"]);

    let rows = vec![
        Row::new().with("product.category", "Electronics").with("order.revenue", 100.0),
        Row::new().with("product.category", "Electronics").with("order.revenue", 50.0),
        Row::new().with("product.category", "Furniture").with("order.revenue", 30.0),
    ];

    let result = run(&config, rows).await.unwrap();
    let rows = table_rows(&result);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("product.category"), Some(&Value::Text("Electronics".into())));
    assert_eq!(rows[0].get("order.revenue"), Some(&Value::Number(2.0)));
    assert_eq!(rows[1].get("product.category"), Some(&Value::Text("Furniture".into())));
    assert_eq!(rows[1].get("order.revenue"), Some(&Value::Number(1.0)));
}

#[tokio::test]
async fn test_between_keeps_only_rows_inside_the_bounds() {
    let config = ReportConfig::new("Price band", ReportKind::Table)
        .with_fields(["product.name", "order.price"])
        .with_filter(ReportFilter::new(
            "order.price",
            Operator::Between,
            FilterValue::many([Value::Number(100_000.0), Value::Number(500_000.0)]),
        ));

    let rows = vec![
        Row::new().with("product.name", "cheap").with("order.price", 50_000.0),
        Row::new().with("product.name", "mid").with("order.price", 275_000.0),
        Row::new().with("product.name", "pricey").with("order.price", 1_200_000.0),
    ];

    let result = run(&config, rows).await.unwrap();
    let rows = table_rows(&result);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("product.name"), Some(&Value::Text("mid".into())));
}

#[tokio::test]
async fn test_execution_is_idempotent() {
    let config = ReportConfig::new("Stable output", ReportKind::Table)
        .with_fields(["product.category", "order.revenue"])
        .with_group_by(["product.category"])
        .with_order_by(OrderBy::desc("order.revenue"));

    let rows = vec![
        Row::new().with("product.category", "A").with("order.revenue", 1.0),
        Row::new().with("product.category", "B").with("order.revenue", 2.0),
        Row::new().with("product.category", "A").with("order.revenue", 3.0),
    ];

    let first = run(&config, rows.clone()).await.unwrap();
    let second = run(&config, rows).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_filters_compose_conjunctively() {
    let base = ReportConfig::new("Base", ReportKind::Table)
        .with_fields(["product.name", "order.price", "order.status"])
        .with_filter(ReportFilter::new(
            "order.price",
            Operator::GreaterThan,
            FilterValue::one(10.0),
        ));
    let narrowed = base.clone().with_filter(ReportFilter::new(
        "order.status",
        Operator::Equals,
        FilterValue::one("shipped"),
    ));

    let rows = vec![
        Row::new().with("product.name", "a").with("order.price", 20.0).with("order.status", "shipped"),
        Row::new().with("product.name", "b").with("order.price", 30.0).with("order.status", "pending"),
        Row::new().with("product.name", "c").with("order.price", 5.0).with("order.status", "shipped"),
    ];

    let base_result = run(&base, rows.clone()).await.unwrap();
    let narrowed_result = run(&narrowed, rows).await.unwrap();

    let base_rows = table_rows(&base_result);
    let narrowed_rows = table_rows(&narrowed_result);
    // Adding a filter can only shrink or preserve the result set.
    assert!(narrowed_rows.len() <= base_rows.len());
    for row in narrowed_rows {
        assert!(base_rows.contains(row));
    }
    assert_eq!(narrowed_rows.len(), 1);
}

#[tokio::test]
async fn test_sort_is_stable_for_equal_keys() {
    let config = ReportConfig::new("Stable sort", ReportKind::Table)
        .with_fields(["product.name", "order.price"])
        .with_order_by(OrderBy::asc("order.price"));

    let rows = vec![
        Row::new().with("product.name", "first").with("order.price", 10.0),
        Row::new().with("product.name", "second").with("order.price", 10.0),
        Row::new().with("product.name", "third").with("order.price", 10.0),
    ];

    let result = run(&config, rows).await.unwrap();
    let names: Vec<&Value> = table_rows(&result)
        .iter()
        .map(|r| r.get("product.name").unwrap())
        .collect();
    assert_eq!(
        names,
        [
            &Value::Text("first".into()),
            &Value::Text("second".into()),
            &Value::Text("third".into()),
        ]
    );
}

#[tokio::test]
async fn test_multi_key_sort() {
    let config = ReportConfig::new("Sorted", ReportKind::Table)
        .with_fields(["order.status", "order.price"])
        .with_order_by(OrderBy::asc("order.status"))
        .with_order_by(OrderBy::desc("order.price"));

    let rows = vec![
        Row::new().with("order.status", "b").with("order.price", 1.0),
        Row::new().with("order.status", "a").with("order.price", 2.0),
        Row::new().with("order.status", "a").with("order.price", 9.0),
    ];

    let result = run(&config, rows).await.unwrap();
    let rows = table_rows(&result);
    assert_eq!(rows[0].get("order.price"), Some(&Value::Number(9.0)));
    assert_eq!(rows[1].get("order.price"), Some(&Value::Number(2.0)));
    assert_eq!(rows[2].get("order.status"), Some(&Value::Text("b".into())));
}

#[tokio::test]
async fn test_date_range_is_an_implicit_inclusive_filter() {
    let config = ReportConfig::new("Q1 orders", ReportKind::Table)
        .with_fields(["product.name", "order.date"])
        .with_date_range(DateRange {
            field: "order.date".to_string(),
            start: date(2024, 1, 1),
            end: date(2024, 3, 31),
        });

    let rows = vec![
        Row::new().with("product.name", "before").with("order.date", date(2023, 12, 31)),
        Row::new().with("product.name", "on-start").with("order.date", date(2024, 1, 1)),
        Row::new().with("product.name", "on-end").with("order.date", date(2024, 3, 31)),
        Row::new().with("product.name", "after").with("order.date", date(2024, 4, 1)),
    ];

    let result = run(&config, rows).await.unwrap();
    let rows = table_rows(&result);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("product.name"), Some(&Value::Text("on-start".into())));
    assert_eq!(rows[1].get("product.name"), Some(&Value::Text("on-end".into())));
}

#[tokio::test]
async fn test_cancellation_aborts_before_fetch() {
    let config = ReportConfig::new("Cancelled", ReportKind::Table).with_fields(["product.name"]);
    let validated = validate(&config, &registry()).unwrap();
    let source = MemoryRowSource::new(vec![Row::new().with("product.name", "x")]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = ReportExecutor::new()
        .execute(&validated, &source, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::Cancelled));
}

#[tokio::test]
async fn test_cancellation_during_fetch_reports_cancelled_not_a_source_error() {
    // A source interrupted by cancellation reports some fetch error; the
    // executor must surface the cancellation, not a retryable source failure.
    struct InterruptedSource;

    #[async_trait]
    impl RowSource for InterruptedSource {
        async fn fetch(
            &self,
            _tables: &[String],
            cancel: &CancellationToken,
        ) -> Result<Vec<Row>, RowSourceError> {
            cancel.cancel();
            Err(RowSourceError::Other("fetch interrupted".to_string()))
        }
    }

    let config = ReportConfig::new("Interrupted", ReportKind::Table).with_fields(["product.name"]);
    let validated = validate(&config, &registry()).unwrap();

    let err = ReportExecutor::new()
        .execute(&validated, &InterruptedSource, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::Cancelled));
}

#[tokio::test]
async fn test_pie_chart_with_duplicate_categories_fails_to_shape() {
    // Ungrouped rows leave duplicate category values, which a pie chart
    // cannot represent.
    let config = ReportConfig::new("Pie", ReportKind::Chart)
        .with_chart_type(ChartKind::Pie)
        .with_fields(["product.category", "order.revenue"]);

    let rows = vec![
        Row::new().with("product.category", "Electronics").with("order.revenue", 10.0),
        Row::new().with("product.category", "Electronics").with("order.revenue", 20.0),
    ];

    let err = run(&config, rows).await.unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::Shape(ShapeError::DuplicatePieCategory(ref key)) if key == "Electronics"
    ));
}

#[tokio::test]
async fn test_grouped_bar_chart_series() {
    let config = ReportConfig::new("Orders per category", ReportKind::Chart)
        .with_chart_type(ChartKind::Bar)
        .with_fields(["product.category", "order.revenue"])
        .with_group_by(["product.category"]);

    let rows = vec![
        Row::new().with("product.category", "Electronics").with("order.revenue", 100.0),
        Row::new().with("product.category", "Electronics").with("order.revenue", 50.0),
        Row::new().with("product.category", "Furniture").with("order.revenue", 30.0),
    ];

    let result = run(&config, rows).await.unwrap();
    match result {
        ReportResult::Chart { chart, series } => {
            assert_eq!(chart, ChartKind::Bar);
            assert_eq!(series.len(), 2);
            assert_eq!(series[0].key, "Electronics");
            assert_eq!(series[0].y, Value::Number(2.0));
            assert_eq!(series[1].key, "Furniture");
            assert_eq!(series[1].y, Value::Number(1.0));
        }
        other => panic!("expected a chart result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_summary_emits_one_count_metric_per_field() {
    let config = ReportConfig::new("Totals", ReportKind::Summary)
        .with_fields(["product.category", "order.revenue"]);

    let rows = vec![
        Row::new().with("product.category", "A").with("order.revenue", 1.0),
        Row::new().with("product.category", "B").with("order.revenue", 2.0),
        Row::new().with("product.category", "C").with("order.revenue", 3.0),
    ];

    let result = run(&config, rows).await.unwrap();
    match result {
        ReportResult::Summary { metrics } => {
            assert_eq!(metrics.len(), 2);
            for metric in &metrics {
                assert_eq!(metric.aggregate, "count");
                assert_eq!(metric.value, Value::Number(3.0));
            }
            assert_eq!(metrics[0].field, "product.category");
            assert_eq!(metrics[1].field, "order.revenue");
        }
        other => panic!("expected a summary result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_runtime_type_aborts_the_whole_report() {
    let config = ReportConfig::new("Bad data", ReportKind::Table)
        .with_fields(["product.name", "order.price"])
        .with_filter(ReportFilter::new(
            "order.price",
            Operator::Between,
            FilterValue::many([Value::Number(0.0), Value::Number(100.0)]),
        ));

    let rows = vec![
        Row::new().with("product.name", "fine").with("order.price", 50.0),
        Row::new().with("product.name", "corrupt").with("order.price", "lots"),
    ];

    let err = run(&config, rows).await.unwrap_err();
    assert!(matches!(err, ExecutionError::TypeMismatch { ref field, .. } if field == "order.price"));
}

#[tokio::test]
async fn test_sorting_on_a_field_absent_from_grouped_rows_fails() {
    // `product.name` resolves in the registry but is neither selected nor a
    // group key, so grouped rows do not carry it.
    let config = ReportConfig::new("Bad sort", ReportKind::Table)
        .with_fields(["product.category", "order.revenue"])
        .with_group_by(["product.category"])
        .with_order_by(OrderBy::asc("product.name"));

    let rows = vec![
        Row::new().with("product.category", "A").with("order.revenue", 1.0),
    ];

    let err = run(&config, rows).await.unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::MissingSortField(ref field) if field == "product.name"
    ));
}

#[tokio::test]
async fn test_null_rows_are_excluded_by_inclusion_filters() {
    let include = ReportConfig::new("Shipped", ReportKind::Table)
        .with_fields(["product.name", "order.status"])
        .with_filter(ReportFilter::new(
            "order.status",
            Operator::Equals,
            FilterValue::one("shipped"),
        ));
    let exclude = ReportConfig::new("Not shipped", ReportKind::Table)
        .with_fields(["product.name", "order.status"])
        .with_filter(ReportFilter::new(
            "order.status",
            Operator::NotEquals,
            FilterValue::one("shipped"),
        ));

    let rows = vec![
        Row::new().with("product.name", "tagged").with("order.status", "shipped"),
        Row::new().with("product.name", "untagged").with("order.status", Value::Null),
    ];

    let included = run(&include, rows.clone()).await.unwrap();
    assert_eq!(table_rows(&included).len(), 1);

    // Rows with missing data are kept by exclusion filters rather than
    // silently dropped.
    let excluded = run(&exclude, rows).await.unwrap();
    let rows = table_rows(&excluded);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("product.name"), Some(&Value::Text("untagged".into())));
}

#[tokio::test]
async fn test_table_columns_follow_selection_order() {
    let config = ReportConfig::new("Ordered columns", ReportKind::Table)
        .with_fields(["order.price", "product.name"]);

    let rows = vec![Row::new().with("product.name", "x").with("order.price", 1.0)];

    let result = run(&config, rows).await.unwrap();
    match result {
        ReportResult::Table { columns, .. } => {
            assert_eq!(columns, ["order.price", "product.name"]);
        }
        other => panic!("expected a table result, got {:?}", other),
    }
}
