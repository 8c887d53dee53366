use crate::exec_params::{
    INPUT, TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX, TRANSFER_MIN_TRANSFER_TIME_RANGE_MIN,
    VALIDATION_DATE,
};
use crate::{ExecParamRepository, ExportFormat, GtfsReader, Notice, NoticeKind, NoticeRepository, Validator};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;

/// The files of a feed, by name
struct Feed {
    files: BTreeMap<&'static str, String>,
    folders: Vec<&'static str>,
}

impl Feed {
    /// One line, two stops, one trip: nothing to report
    fn valid() -> Self {
        let files = [
            (
                "agency.txt",
                "agency_id,agency_name,agency_url,agency_timezone,agency_lang\n\
                 stm,STM,https://www.stm.info,America/Montreal,fr\n",
            ),
            (
                "stops.txt",
                "stop_id,stop_name,stop_lat,stop_lon\n\
                 s1,Berri-UQAM,45.5150,-73.5610\n\
                 s2,Sherbrooke,45.5185,-73.5680\n",
            ),
            (
                "routes.txt",
                "route_id,agency_id,route_short_name,route_long_name,route_type\n\
                 r1,stm,1,Ligne verte,1\n",
            ),
            (
                "trips.txt",
                "route_id,service_id,trip_id\n\
                 r1,weekdays,t1\n",
            ),
            (
                "calendar.txt",
                "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                 weekdays,1,1,1,1,1,0,0,20240101,20241231\n",
            ),
            (
                "stop_times.txt",
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                 t1,08:00:00,08:00:00,s1,1\n\
                 t1,08:05:00,08:05:00,s2,2\n",
            ),
        ];
        Feed {
            files: files
                .into_iter()
                .map(|(name, content)| (name, content.to_owned()))
                .collect(),
            folders: vec![],
        }
    }

    fn with(mut self, name: &'static str, content: &str) -> Self {
        self.files.insert(name, content.to_owned());
        self
    }

    fn without(mut self, name: &str) -> Self {
        self.files.remove(name);
        self
    }

    fn with_folder(mut self, name: &'static str) -> Self {
        self.folders.push(name);
        self
    }

    fn zip(&self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for folder in &self.folders {
            writer.add_directory(*folder, FileOptions::default()).unwrap();
        }
        for (name, content) in &self.files {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn validate_with(&self, params: ExecParamRepository) -> NoticeRepository {
        let raw = GtfsReader::default()
            .read_from_reader(Cursor::new(self.zip()))
            .unwrap();
        Validator::new(params).run_on("feed.zip", &raw)
    }

    fn validate(&self) -> NoticeRepository {
        self.validate_with(params())
    }
}

fn params() -> ExecParamRepository {
    let mut params = ExecParamRepository::new();
    params.add(VALIDATION_DATE, "20240601").unwrap();
    params
}

/// Codes of the notices, without the process info closing every report
fn codes(notices: &NoticeRepository) -> Vec<&'static str> {
    notices
        .get_all()
        .iter()
        .map(Notice::code)
        .filter(|c| *c != "I001")
        .collect()
}

fn find(notices: &NoticeRepository, code: &str) -> Vec<Notice> {
    notices
        .get_all()
        .into_iter()
        .filter(|n| n.code() == code)
        .collect()
}

#[test]
fn valid_feed() {
    let notices = Feed::valid().validate();
    assert!(codes(&notices).is_empty(), "{:?}", notices.get_all());
    let all = notices.get_all();
    assert_eq!(1, all.len());
    assert_eq!("I001", all[0].code());
}

#[test]
fn validation_is_idempotent() {
    let feed = Feed::valid()
        .with(
            "routes.txt",
            "route_id,agency_id,route_short_name,route_long_name,route_type,route_color,route_text_color\n\
             r1,stm,1,Ligne verte,1,FFFFFF,FFFFFF\n\
             r2,stm,1,Ligne orange,1,,\n",
        )
        .with("extra.txt", "a,b\n1,2\n");
    // the elapsed time is the only value allowed to change between two runs
    let without_time = |notices: NoticeRepository| -> Vec<Notice> {
        notices
            .get_all()
            .into_iter()
            .map(|mut n| {
                if let NoticeKind::ValidationProcessInfo {
                    processing_time_secs,
                    ..
                } = &mut n.kind
                {
                    *processing_time_secs = 0.0;
                }
                n
            })
            .collect()
    };
    let first = without_time(feed.validate());
    assert!(first.len() > 1);
    assert_eq!(Some("I001"), first.last().map(Notice::code));
    assert_eq!(first, without_time(feed.validate()));
}

#[test]
fn fare_rule_without_fare_id() {
    let notices = Feed::valid()
        .with(
            "fare_attributes.txt",
            "fare_id,price,currency_type,payment_method,transfers\n\
             regular,3.50,CAD,0,\n",
        )
        .with(
            "fare_rules.txt",
            "fare_id,route_id\n\
             regular,r1\n\
             ,r1\n",
        )
        .validate();
    assert_eq!(vec!["E002"], codes(&notices));
    let notice = &find(&notices, "E002")[0];
    assert_eq!(Some("fare_rules.txt".to_owned()), notice.filename);
    assert_eq!(
        NoticeKind::MissingRequiredValue {
            field_name: "fare_id"
        },
        notice.kind
    );
}

#[test]
fn overlapping_frequencies() {
    let notices = Feed::valid()
        .with(
            "frequencies.txt",
            "trip_id,start_time,end_time,headway_secs\n\
             t1,12:00:00,18:00:00,600\n\
             t1,15:44:00,21:43:00,600\n\
             t1,22:00:00,23:00:00,600\n",
        )
        .validate();
    assert_eq!(vec!["E053"], codes(&notices));
    let notice = &find(&notices, "E053")[0];
    assert_eq!("t1", notice.entity_id);
    assert_eq!(
        NoticeKind::OverlappingTripFrequencies {
            previous_start_time: "12:00:00".to_owned(),
            previous_end_time: "18:00:00".to_owned(),
            start_time: "15:44:00".to_owned(),
            end_time: "21:43:00".to_owned(),
        },
        notice.kind
    );
}

#[test]
fn route_color_contrast() {
    let notices = Feed::valid()
        .with(
            "routes.txt",
            "route_id,agency_id,route_short_name,route_long_name,route_type,route_color,route_text_color\n\
             r1,stm,1,Ligne verte,1,ffffff,ffffff\n\
             r2,stm,2,Ligne orange,1,ffffff,000000\n",
        )
        .validate();
    let contrast = find(&notices, "E025");
    assert_eq!(1, contrast.len());
    assert_eq!("r1", contrast[0].entity_id);
    assert_eq!(
        NoticeKind::RouteColorAndTextInsufficientContrast {
            contrast_ratio: 1.0
        },
        contrast[0].kind
    );
}

#[test]
fn single_stop_time_trip() {
    let notices = Feed::valid()
        .with(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             t1,08:00:00,08:00:00,s1,1\n",
        )
        .validate();
    assert_eq!(vec!["E051"], codes(&notices));
    assert_eq!("t1", find(&notices, "E051")[0].entity_id);
}

#[test]
fn transfer_time_bounds() {
    let transfers = "from_stop_id,to_stop_id,transfer_type,min_transfer_time\n\
                     s1,s2,2,240\n\
                     s2,s1,2,3\n\
                     s1,s1,2,90\n\
                     s2,s2,2,\n";
    let mut bounds = params();
    bounds.add(TRANSFER_MIN_TRANSFER_TIME_RANGE_MIN, "40").unwrap();
    bounds.add(TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX, "160").unwrap();

    let notices = Feed::valid()
        .with("transfers.txt", transfers)
        .validate_with(bounds.clone());
    assert_eq!(vec!["W009", "W009"], codes(&notices));
    let actual: Vec<i64> = find(&notices, "W009")
        .iter()
        .map(|n| match n.kind {
            NoticeKind::SuspiciousMinTransferTime {
                range_min,
                range_max,
                actual_value,
            } => {
                assert_eq!((40, 160), (range_min, range_max));
                actual_value
            }
            ref kind => panic!("unexpected notice {:?}", kind),
        })
        .collect();
    assert_eq!(vec![240, 3], actual);

    // the bounds are in range
    let notices = Feed::valid()
        .with(
            "transfers.txt",
            "from_stop_id,to_stop_id,transfer_type,min_transfer_time\n\
             s1,s2,2,40\n\
             s2,s1,2,160\n",
        )
        .validate_with(bounds);
    assert!(codes(&notices).is_empty());
}

#[test]
fn calendar_files_are_alternatives() {
    let calendar_dates = "service_id,date,exception_type\nweekdays,20240101,1\n";

    let only_dates = Feed::valid()
        .without("calendar.txt")
        .with("calendar_dates.txt", calendar_dates)
        .validate();
    assert!(codes(&only_dates).is_empty());

    let both = Feed::valid()
        .with("calendar_dates.txt", calendar_dates)
        .validate();
    assert!(codes(&both).is_empty());

    let none = Feed::valid().without("calendar.txt").validate();
    let missing = find(&none, "E028");
    assert_eq!(1, missing.len());
    assert!(find(&none, "E001").is_empty());
}

#[test]
fn missing_required_files() {
    let notices = Feed::valid().without("agency.txt").without("stops.txt").validate();
    let mut files: Vec<Option<String>> = find(&notices, "E001")
        .into_iter()
        .map(|n| n.filename)
        .collect();
    files.sort();
    assert_eq!(
        vec![Some("agency.txt".to_owned()), Some("stops.txt".to_owned())],
        files
    );
}

#[test]
fn header_deltas() {
    let extra = Feed::valid()
        .with(
            "trips.txt",
            "route_id,service_id,trip_id,colour,trip_headsign,vehicle\n\
             r1,weekdays,t1,green,Angrignon,MR-73\n",
        )
        .validate();
    assert_eq!(vec!["W001"], codes(&extra));
    assert_eq!(
        NoticeKind::NonStandardHeaders {
            extra_headers: vec!["colour".to_owned(), "vehicle".to_owned()]
        },
        find(&extra, "W001")[0].kind
    );

    let missing = Feed::valid()
        .with(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id\n\
             t1,08:00:00,08:00:00,s1\n",
        )
        .validate();
    let missing_headers = find(&missing, "E016");
    assert_eq!(1, missing_headers.len());
    assert_eq!(
        NoticeKind::MissingHeaders {
            expected_headers: vec![
                "trip_id".to_owned(),
                "stop_id".to_owned(),
                "stop_sequence".to_owned()
            ],
            actual_headers: vec![
                "trip_id".to_owned(),
                "arrival_time".to_owned(),
                "departure_time".to_owned(),
                "stop_id".to_owned()
            ],
        },
        missing_headers[0].kind
    );
}

#[test]
fn folders_and_extra_files() {
    let notices = Feed::valid()
        .with_folder("__MACOSX/")
        .with("notes.txt", "note\nhello\n")
        .validate();
    assert_eq!(vec!["W003", "W004"], codes(&notices));
    assert_eq!(
        Some("notes.txt".to_owned()),
        find(&notices, "W004")[0].filename
    );
}

#[test]
fn nested_files_are_not_read() {
    let stops = Feed::valid().files["stops.txt"].clone();
    let feed = Feed::valid()
        .without("stops.txt")
        .with("gtfs/stops.txt", &stops);

    let raw = GtfsReader::default()
        .read_from_reader(Cursor::new(feed.zip()))
        .unwrap();
    assert!(!raw.tables.contains_key("stops.txt"));
    assert!(!raw.tables.contains_key("gtfs/stops.txt"));
    assert_eq!(vec!["gtfs/".to_owned()], raw.folders);

    let notices = feed.validate();
    let folders = find(&notices, "W003");
    assert_eq!(1, folders.len());
    assert_eq!(
        NoticeKind::InputZipContainsFolder {
            folder_name: "gtfs/".to_owned()
        },
        folders[0].kind
    );
    assert!(find(&notices, "E001")
        .iter()
        .any(|n| n.filename.as_deref() == Some("stops.txt")));
}

#[test]
fn unreadable_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gtfs.zip");
    std::fs::write(&path, b"this is not a zip archive").unwrap();

    let mut params = params();
    params.add(INPUT, path.display().to_string()).unwrap();
    let notices = Validator::new(params).run();
    let all = notices.get_all();
    assert_eq!(1, all.len());
    assert_eq!("E021", all[0].code());
}

#[test]
fn read_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in &Feed::valid().files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    let mut params = params();
    params.add(INPUT, dir.path().display().to_string()).unwrap();
    let notices = Validator::new(params).run();
    assert!(codes(&notices).is_empty(), "{:?}", notices.get_all());
}

#[test]
fn json_report() {
    let notices = Feed::valid()
        .with(
            "routes.txt",
            "route_id,agency_id,route_short_name,route_long_name,route_type,route_color,route_text_color\n\
             r1,stm,1,Ligne verte,1,ffffff,ffffff\n",
        )
        .validate();

    let dir = tempfile::tempdir().unwrap();
    let mut exporter = NoticeRepository::exporter(ExportFormat::Json, dir.path()).unwrap();
    notices.export(exporter.as_mut()).unwrap();
    drop(exporter);

    let content = std::fs::read_to_string(dir.path().join("results.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&content).unwrap();
    let results = report["results"].as_array().unwrap();
    assert_eq!(2, results.len());
    assert_eq!("E025", results[0]["code"]);
    assert_eq!("ERROR", results[0]["severity"]);
    assert_eq!("routes.txt", results[0]["filename"]);
    assert_eq!("r1", results[0]["entityId"]);
    assert_eq!(1.0, results[0]["noticeSpecific"]["contrastRatio"]);
    assert_eq!("I001", results[1]["code"]);
    assert_eq!("INFO", results[1]["severity"]);
}

#[test]
fn protobuf_report() {
    let notices = Feed::valid().without("stops.txt").validate();
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = NoticeRepository::exporter(ExportFormat::Protobuf, dir.path()).unwrap();
    notices.export(exporter.as_mut()).unwrap();
    drop(exporter);

    let content = std::fs::read(dir.path().join("results.pb")).unwrap();
    assert!(!content.is_empty());
}
