use std::fs;

use chrono::Datelike;
use datatable::io::{export_file, import, CsvOptions};
use datatable::{AggregateBy, AggregationType, ColumnType, GroupBy, Value};
use tempfile::tempdir;
use test_log::test;

const PHONE_DATA: &str = "\
index,date,duration,item,month,network,network_type
0,15/10/14 06:58,34.429,data,2014-11,data,data
1,15/10/14 06:58,13,call,2014-11,Vodafone,mobile
2,15/10/14 14:46,23,call,2014-11,Meteor,mobile
3,15/10/14 14:48,4,call,2014-11,Tesco,mobile
4,15/10/14 17:27,4,call,2014-11,Tesco,mobile
5,15/10/14 18:55,4,call,2014-11,Tesco,mobile
6,16/10/14 06:58,34.429,data,2014-11,data,data
7,16/10/14 15:01,602,call,2014-11,Three,mobile
8,16/10/14 15:12,1050,call,2014-11,Three,mobile
9,16/10/14 15:30,19,call,2014-11,voicemail,voicemail
10,01/01/15 10:06,2,sms,2014-12,Vodafone,mobile
";

#[test]
fn test_import_group_and_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("phone_data.csv");
    fs::write(&path, PHONE_DATA).unwrap();

    let options = CsvOptions::new()
        .has_header(true)
        .accept_date("%d/%m/%y %H:%M")
        .accept_date("%Y-%m");
    let table = import("csv", &path, &options).unwrap();
    assert_eq!(table.num_rows(), 11);
    assert_eq!(table.column("index").unwrap().column_type(), &ColumnType::INT64);
    assert_eq!(table.column("date").unwrap().column_type(), &ColumnType::TIME);
    assert_eq!(table.column("duration").unwrap().column_type(), &ColumnType::FLOAT64);
    assert_eq!(table.column("month").unwrap().column_type(), &ColumnType::STRING);

    let count = table
        .aggregate(&[AggregateBy::new(AggregationType::Count, "index")])
        .unwrap();
    assert_eq!(count.get(0, "count_index").unwrap(), Value::Int64(11));

    let by_year = table
        .group_by(vec![GroupBy::new("year", |row| {
            row.value("date").as_time().map(|t| Value::Int(t.year() as isize))
        })
        .with_type(ColumnType::INT)])
        .unwrap()
        .aggregate(&[
            AggregateBy::new(AggregationType::Sum, "duration"),
            AggregateBy::new(AggregationType::CountDistinct, "network"),
        ])
        .unwrap();
    assert_eq!(by_year.num_rows(), 2);
    assert_eq!(by_year.get(0, "year").unwrap(), Value::Int(2014));
    assert_eq!(by_year.get(1, "sum_duration").unwrap(), Value::Float64(2.0));
    assert_eq!(by_year.get(0, "count_distinct_network").unwrap(), Value::Int64(6));

    let out = dir.path().join("by_year.csv");
    export_file(&by_year, &out).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("year,sum_duration,count_distinct_network\n2014,"));
    assert!(text.ends_with("2015,2,1\n"));
}

#[test]
fn test_missing_file() {
    let err = import("nope", "/definitely/not/here.csv", &CsvOptions::new()).unwrap_err();
    assert_eq!(err.kind(), datatable::ErrorKind::Io);
}
