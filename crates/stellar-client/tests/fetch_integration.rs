// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{Value, json};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use stellar_client::{
    ClientConfig, FetchRequest, StellarClient, StellarError, TimeRange, read_csv,
};

const ORG: &str = "newsunroad";
const SITE: &str = "pc_solstation_a";
const TOKEN: &str = "test_token";
const COOKIE: &str = "connect.sid=s%3Aabc";

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn wire(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn mock_bootstrap(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", format!("/api/v0/setOrganization/{ORG}").as_str())
        .match_header("authorization", format!("token {TOKEN}").as_str())
        .with_status(200)
        .with_header("set-cookie", &format!("{COOKIE}; Path=/; HttpOnly"))
}

fn window_query(start: NaiveDateTime, end: NaiveDateTime, params: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("start".into(), wire(start)),
        Matcher::UrlEncoded("end".into(), wire(end)),
        Matcher::UrlEncoded("binDuration".into(), "5-mins".into()),
        Matcher::UrlEncoded("params".into(), params.into()),
    ])
}

/// Hourly battery samples over `[start, end)`, split into two entries
fn battery_body(start: NaiveDateTime, end: NaiveDateTime) -> String {
    let mut records = Vec::new();
    let mut t = start;
    let mut i = 0.0;
    while t < end {
        records.push(json!({
            "time": t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            "batteryVoltage": 50.0 + i,
            "batteryCurrent": i
        }));
        t += TimeDelta::hours(1);
        i += 1.0;
    }
    let half = records.len() / 2;
    let second = records.split_off(half);
    json!({"data": [{"timeSeries": records}, {"timeSeries": second}]}).to_string()
}

fn mock_window(
    server: &mut ServerGuard,
    start: NaiveDateTime,
    end: NaiveDateTime,
    status: usize,
    body: &str,
) -> Mock {
    server
        .mock("GET", format!("/api/v0/ts/{SITE}").as_str())
        .match_query(window_query(start, end, "batteryVoltage,batteryCurrent"))
        .match_header("authorization", format!("token {TOKEN}").as_str())
        .match_header("cookie", COOKIE)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
}

fn config(server: &ServerGuard, batch_size_days: i64) -> ClientConfig {
    ClientConfig::new(ORG, SITE, TOKEN, "batteryVoltage,batteryCurrent")
        .with_base_url(server.url())
        .with_batch_size_days(batch_size_days)
}

#[test]
fn test_thirty_days_in_two_batches() {
    let mut server = Server::new();
    let bootstrap = mock_bootstrap(&mut server).create();
    let (start, mid, stop) = (day(2018, 11, 1), day(2018, 11, 21), day(2018, 12, 1));
    let first = mock_window(&mut server, start, mid, 200, &battery_body(start, mid)).create();
    let second = mock_window(&mut server, mid, stop, 200, &battery_body(mid, stop)).create();

    let client = StellarClient::new(config(&server, 20)).unwrap();
    let frame = client.get_data(start, stop).unwrap();

    bootstrap.assert();
    first.assert();
    second.assert();

    assert_eq!(frame.row_count(), 30 * 24);
    let mut names = frame.column_names();
    names.sort_unstable();
    assert_eq!(names, vec!["batteryCurrent", "batteryVoltage"]);
    assert!(frame.misaligned_columns().is_empty());
    assert_eq!(frame.first_timestamp(), Some(start));
    assert_eq!(frame.last_timestamp(), Some(stop - TimeDelta::hours(1)));
    assert!(
        frame.index().windows(2).all(|pair| pair[0] < pair[1]),
        "index must be strictly increasing across the batch boundary"
    );
}

#[test]
fn test_server_error_on_second_of_three_windows_aborts() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let (d1, d2, d3, d4) = (
        day(2019, 5, 6),
        day(2019, 5, 7),
        day(2019, 5, 8),
        day(2019, 5, 9),
    );
    let first = mock_window(&mut server, d1, d2, 200, &battery_body(d1, d2)).create();
    let second = mock_window(&mut server, d2, d3, 500, "internal error").create();
    let third = mock_window(&mut server, d3, d4, 200, &battery_body(d3, d4))
        .expect(0)
        .create();

    let client = StellarClient::new(config(&server, 1)).unwrap();
    let result = client.get_data(d1, d4);

    match result {
        Err(StellarError::ApiError {
            site,
            status,
            message,
        }) => {
            assert_eq!(site, SITE);
            assert_eq!(status, 500);
            assert_eq!(message, "internal error");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    first.assert();
    second.assert();
    third.assert();
}

#[test]
fn test_api_error_message_is_actionable() {
    let err = StellarError::ApiError {
        site: "pc_typo".to_owned(),
        status: 400,
        message: "bad request".to_owned(),
    };
    let text = err.to_string();
    assert!(text.contains("pc_typo"));
    assert!(text.contains("site name"));
}

#[test]
fn test_rejected_token_on_data_request() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let (start, stop) = (day(2019, 5, 6), day(2019, 5, 7));
    let window = mock_window(&mut server, start, stop, 403, "").create();

    let client = StellarClient::new(config(&server, 20)).unwrap();

    assert!(matches!(
        client.get_data(start, stop),
        Err(StellarError::AuthenticationFailed { .. })
    ));
    window.assert();
}

#[test]
fn test_malformed_body_is_skipped() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let (d1, d2, d3) = (day(2019, 5, 6), day(2019, 5, 7), day(2019, 5, 8));
    let first =
        mock_window(&mut server, d1, d2, 200, "<html>upstream timeout</html>").create();
    let second = mock_window(&mut server, d2, d3, 200, &battery_body(d2, d3)).create();

    let client = StellarClient::new(config(&server, 1)).unwrap();
    let frame = client.get_data(d1, d3).unwrap();

    first.assert();
    second.assert();
    assert_eq!(frame.row_count(), 24);
    assert_eq!(frame.first_timestamp(), Some(d2));
}

#[test]
fn test_missing_parameter_is_not_padded() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let (start, stop) = (day(2018, 11, 14), day(2018, 11, 15));
    let body = json!({"data": [{"timeSeries": [
        {"time": "2018-11-14T00:00:00.000Z", "batteryVoltage": 52.1, "batteryCurrent": 1.5},
        {"time": "2018-11-14T00:05:00.000Z", "batteryVoltage": 52.2},
        {"time": "2018-11-14T00:10:00.000Z", "batteryVoltage": 52.3, "batteryCurrent": 1.7}
    ]}]})
    .to_string();
    let _window = mock_window(&mut server, start, stop, 200, &body).create();

    let client = StellarClient::new(config(&server, 20)).unwrap();
    let frame = client.get_data(start, stop).unwrap();

    let voltage = frame.column("batteryVoltage").unwrap();
    let current = frame.column("batteryCurrent").unwrap();
    assert_eq!(voltage.len(), current.len() + 1);
    assert_eq!(current.values, vec![Some(1.5), Some(1.7)]);
    assert_eq!(frame.misaligned_columns(), vec!["batteryCurrent"]);
}

#[test]
fn test_empty_range_makes_no_requests() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let data = server
        .mock("GET", Matcher::Any)
        .with_status(200)
        .expect(0)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("{}.csv");
    let client = StellarClient::new(config(&server, 20).with_save_to(out.to_string_lossy()))
        .unwrap();

    let same = client.get_data(day(2019, 5, 6), day(2019, 5, 6)).unwrap();
    let inverted = client.get_data(day(2019, 5, 7), day(2019, 5, 6)).unwrap();

    assert!(same.is_empty());
    assert!(inverted.is_empty());
    assert_eq!(same.row_count(), 0);
    assert!(same.columns().is_empty());
    let saved = dir.path().join(format!("{SITE}.csv"));
    assert_eq!(std::fs::read_to_string(saved).unwrap(), "time\n");
    data.assert();
}

#[test]
fn test_saved_file_round_trips() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let (start, stop) = (day(2018, 11, 14), day(2018, 11, 15));
    let _window =
        mock_window(&mut server, start, stop, 200, &battery_body(start, stop)).create();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.csv");
    let client = StellarClient::new(config(&server, 20).with_save_to(out.to_string_lossy()))
        .unwrap();
    let frame = client.get_data(start, stop).unwrap();

    let reloaded = read_csv(&out).unwrap();
    assert_eq!(reloaded.row_count(), frame.row_count());
    assert_eq!(reloaded.column_names(), frame.column_names());
    assert_eq!(reloaded.index_utc(), frame.index_utc());
    assert_eq!(reloaded, frame);
}

#[test]
fn test_session_reused_across_fetches() {
    let mut server = Server::new();
    let bootstrap = mock_bootstrap(&mut server).expect(1).create();
    let (d1, d2, d3) = (day(2019, 5, 6), day(2019, 5, 7), day(2019, 5, 8));
    let _first = mock_window(&mut server, d1, d2, 200, &battery_body(d1, d2)).create();
    let _second = mock_window(&mut server, d2, d3, 200, &battery_body(d2, d3)).create();

    let client = StellarClient::new(config(&server, 20)).unwrap();
    let a = client.get_data(d1, d2).unwrap();
    let b = client.get_data(d2, d3).unwrap();

    assert_eq!(a.row_count(), 24);
    assert_eq!(b.row_count(), 24);
    assert_eq!(b.first_timestamp(), Some(d2));
    bootstrap.assert();
}

#[test]
fn test_explicit_fetch_request() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let (start, stop) = (day(2019, 5, 6), day(2019, 5, 7));
    let window = server
        .mock("GET", "/api/v0/ts/pc_solstation_a_mtr5")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("binDuration".into(), "1-mins".into()),
            Matcher::UrlEncoded(
                "params".into(),
                "meteredLoadEnergyUse,meteredLoadPower".into(),
            ),
        ]))
        .with_status(200)
        .with_body(
            json!({"data": [{"timeSeries": [
                {"time": "2019-05-06T00:00:00Z", "meteredLoadEnergyUse": 10, "meteredLoadPower": Value::Null}
            ]}]})
            .to_string(),
        )
        .create();

    let client = StellarClient::new(config(&server, 20)).unwrap();
    let request = FetchRequest::new(
        "pc_solstation_a_mtr5",
        vec![
            "meteredLoadEnergyUse".to_owned(),
            "meteredLoadPower".to_owned(),
        ],
        "1-mins",
        TimeRange::new(start, stop),
    );
    let frame = client.fetch(&request).unwrap();

    window.assert();
    assert_eq!(frame.row_count(), 1);
    assert_eq!(frame.value(0, "meteredLoadEnergyUse"), Some(10.0));
    assert_eq!(frame.value(0, "meteredLoadPower"), None);
}

#[test]
fn test_invalid_batch_size_fails_before_bootstrap() {
    let mut server = Server::new();
    let bootstrap = mock_bootstrap(&mut server).expect(0).create();

    for days in [0, -5] {
        let result = StellarClient::new(config(&server, days));
        assert!(matches!(result, Err(StellarError::ConfigError(_))));
    }
    bootstrap.assert();
}

#[test]
fn test_bootstrap_failure_surfaces_at_construction() {
    let mut server = Server::new();
    let bootstrap = server
        .mock("POST", format!("/api/v0/setOrganization/{ORG}").as_str())
        .with_status(500)
        .create();

    let result = StellarClient::new(config(&server, 20));

    assert!(matches!(
        result,
        Err(StellarError::BootstrapFailed { status: 500, .. })
    ));
    bootstrap.assert();
}

#[test]
fn test_invalid_fetch_request_is_rejected_before_sending() {
    let mut server = Server::new();
    let _bootstrap = mock_bootstrap(&mut server).create();
    let data = server
        .mock("GET", Matcher::Any)
        .with_status(200)
        .with_body(r#"{"data": []}"#)
        .expect(0)
        .create();
    let client = StellarClient::new(config(&server, 20)).unwrap();
    let range = TimeRange::new(day(2019, 5, 6), day(2019, 5, 7));

    let invalid = [
        FetchRequest::new(SITE, vec![" ".to_owned()], "5-mins", range),
        FetchRequest::new(SITE, vec!["solarPower".to_owned(), String::new()], "5-mins", range),
        FetchRequest::new(SITE, vec!["solarPower".to_owned()], "", range),
        FetchRequest::new(" ", vec!["solarPower".to_owned()], "5-mins", range),
        FetchRequest::new(SITE, vec![], "5-mins", range),
    ];
    for request in &invalid {
        assert!(
            matches!(client.fetch(request), Err(StellarError::ConfigError(_))),
            "{request:?} should be rejected"
        );
    }
    data.assert();
}

/// Address nothing listens on
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0_u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

/// Answers the organization selection, then closes the data connection
/// without a response
fn hang_up_after_bootstrap() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_request_head(&mut stream);
        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\nset-cookie: connect.sid=abc; Path=/\r\n\
                  content-length: 0\r\nconnection: close\r\n\r\n",
            )
            .unwrap();
        drop(stream);

        let (mut stream, _) = listener.accept().unwrap();
        read_request_head(&mut stream);
    });
    format!("http://{addr}")
}

#[test]
fn test_unreachable_host_is_a_transport_error() {
    let config = ClientConfig::new(ORG, SITE, TOKEN, "batteryVoltage")
        .with_base_url(closed_port_url());

    let err = StellarClient::new(config).unwrap_err();

    assert!(matches!(err, StellarError::HttpError(_)), "{err:?}");
    assert!(!err.to_string().contains("site name"));
}

#[test]
fn test_dropped_data_connection_is_a_transport_error() {
    let config = ClientConfig::new(ORG, SITE, TOKEN, "batteryVoltage")
        .with_base_url(hang_up_after_bootstrap());
    let client = StellarClient::new(config).unwrap();

    let err = client
        .get_data(day(2019, 5, 6), day(2019, 5, 7))
        .unwrap_err();

    assert!(matches!(err, StellarError::HttpError(_)), "{err:?}");
    let message = err.to_string();
    assert!(!message.contains("site name"));
    assert!(!message.contains("parameter list"));
}
