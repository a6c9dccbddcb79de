//! Queries against a complete report, as written by the load-testing tool.

use loadtrend_query::{extract, extract_first, Query, ReportDocument};

const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE report>
<report version="4.7">
  <summary>
    <all-summary>
      <statistic-item type="httppage" name="Pages" avg="1,234" min="0,11" max="9,8" />
      <statistic-item type="httprequest" name="Requests" avg="0,42" />
    </all-summary>
    <statistics>
      <statistic name="total_duration" value="00:05:00" />
      <statistic name="error_percentile" value="12 %" />
      <statistic name="average_hits" value="1 024,5" />
    </statistics>
  </summary>
  <virtual-users>
    <statistic-item name="BrowseCatalog" avg="3,2" percentile2="4,1" error_rate="&lt;0.01">
      <statistic-item name="Actions" avg="2,9">
        <statistic-item name="Login" avg="0,87" percentile2="1,3" error_rate="0" />
        <statistic-item name="Search" avg="-" percentile2="NaN" error_rate="+INF" />
      </statistic-item>
    </statistic-item>
  </virtual-users>
  <monitors>
    <monitored-host name="lg1">
      <monitor name="CPU">
        <counters>
          <statistic-item name="lg1/CPU/User" avg="+56,7" value="61" />
        </counters>
      </monitor>
    </monitored-host>
  </monitors>
</report>"#;

fn report() -> ReportDocument {
    ReportDocument::parse(REPORT).expect("sample report parses")
}

#[test]
fn test_summary_statistics() {
    let doc = report();
    assert_eq!(
        extract(
            "/report/summary/all-summary/statistic-item[@type='httppage']/@avg",
            &doc
        )
        .unwrap(),
        Some(1.234)
    );
    assert_eq!(
        extract(
            "/report/summary/statistics/statistic[@name='error_percentile']/@value",
            &doc
        )
        .unwrap(),
        Some(12.0)
    );
    assert_eq!(
        extract(
            "/report/summary/statistics/statistic[@name='average_hits']/@value",
            &doc
        )
        .unwrap(),
        Some(1024.5)
    );
    assert_eq!(
        extract(
            "/report/summary/statistics/statistic[@name='total_duration']/@value",
            &doc
        )
        .unwrap(),
        None
    );
}

#[test]
fn test_nested_virtual_user_statistics() {
    let doc = report();
    let login = "/report/virtual-users/statistic-item[@name='BrowseCatalog']\
                 /statistic-item[@name='Actions']/statistic-item[@name='Login']";

    assert_eq!(extract(&format!("{login}/@avg"), &doc).unwrap(), Some(0.87));
    assert_eq!(
        extract(&format!("{login}/@percentile2"), &doc).unwrap(),
        Some(1.3)
    );
    assert_eq!(
        extract(&format!("{login}/@error_rate"), &doc).unwrap(),
        Some(0.0)
    );
    assert_eq!(
        extract(
            "/report/virtual-users/statistic-item[@name='BrowseCatalog']/@error_rate",
            &doc
        )
        .unwrap(),
        Some(0.0)
    );
}

#[test]
fn test_non_numeric_statistics_are_absent() {
    let doc = report();
    let search = "/report/virtual-users/statistic-item[@name='BrowseCatalog']\
                  /statistic-item[@name='Actions']/statistic-item[@name='Search']";
    for attribute in ["avg", "percentile2", "error_rate"] {
        assert_eq!(
            extract(&format!("{search}/@{attribute}"), &doc).unwrap(),
            None,
            "attribute {attribute}"
        );
    }
}

#[test]
fn test_monitor_counter_is_the_fallback_alternative() {
    let doc = report();
    let alternatives = [
        Query::parse(
            "/report/virtual-users/statistic-item[@name='lg1/CPU/User']/@avg",
        )
        .unwrap(),
        Query::parse(
            "/report/monitors/monitored-host[@name='lg1']/monitor/counters\
             /statistic-item[@name='lg1/CPU/User']/@avg",
        )
        .unwrap(),
    ];
    assert_eq!(extract_first(&alternatives, &doc), Some(56.7));
}

#[test]
fn test_report_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xml");
    std::fs::write(&path, REPORT).unwrap();

    let doc = ReportDocument::open(&path).unwrap();
    assert_eq!(doc, report());
}
