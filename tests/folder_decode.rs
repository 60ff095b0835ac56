use perf_check::folder::{FolderDimensions, decode, is_date_segment};

#[test]
fn carrier_branch() {
    let d = decode("20240101/Seoul/Gangnam/East/skt/5g/MyGame/PhoneX");
    assert_eq!(
        d,
        FolderDimensions {
            date: "20240101".into(),
            city: "Seoul".into(),
            area: "Gangnam".into(),
            region: "East".into(),
            carrier: "skt".into(),
            network: "5G".into(),
            device: "PhoneX".into(),
            game: "MyGame".into(),
        }
    );
}

#[test]
fn wifi_branch_shifts_game_and_device() {
    let d = decode("tests/batch/20240101/Seoul/Gangnam/East/WIFI/MyGame/PhoneX");
    assert_eq!(d.date, "20240101");
    assert_eq!(d.region, "East");
    assert_eq!(d.carrier, "");
    assert_eq!(d.network, "WIFI");
    assert_eq!(d.game, "MyGame");
    assert_eq!(d.device, "PhoneX");
}

#[test]
fn wifi_match_ignores_case() {
    let d = decode("20240101/Seoul/Gangnam/East/wiFi/MyGame/PhoneX");
    assert_eq!(d.network, "WIFI");
    assert_eq!(d.carrier, "");
}

#[test]
fn unknown_network_type_is_blank() {
    let d = decode("20240101/Busan/Haeundae/South/kt/lte/MyGame/PhoneY");
    assert_eq!(d.carrier, "kt");
    assert_eq!(d.network, "");
    assert_eq!(d.game, "MyGame");
    assert_eq!(d.device, "PhoneY");
}

#[test]
fn backslash_separators() {
    let d = decode(r"C:\data\20240101\Seoul\Gangnam\East\skt\4g\MyGame\PhoneX");
    assert_eq!(d.network, "4G");
    assert_eq!(d.device, "PhoneX");
}

#[test]
fn segments_are_trimmed() {
    let d = decode("20240101/ Seoul /  /East/skt/5g/MyGame/PhoneX ");
    assert_eq!(d.city, "Seoul");
    assert_eq!(d.area, "");
    assert_eq!(d.region, "East");
    assert_eq!(d.device, "PhoneX");
}

#[test]
fn missing_trailing_segments_are_blank() {
    let d = decode("20240101/Seoul/Gangnam/East/skt");
    assert_eq!(d.carrier, "skt");
    assert_eq!(d.network, "");
    assert_eq!(d.game, "");
    assert_eq!(d.device, "");
}

#[test]
fn short_path_keeps_only_date() {
    let d = decode("20240101/Seoul/Gangnam");
    assert_eq!(d.date, "20240101");
    assert_eq!(d.city, "Unknown");
    assert_eq!(d.network, "Unknown");
}

#[test]
fn no_date_means_all_unknown() {
    assert_eq!(decode("misc/Seoul/Gangnam/East/skt/5g/G/D"), FolderDimensions::default());
    assert_eq!(decode("."), FolderDimensions::default());
}

#[test]
fn implausible_dates_are_skipped() {
    let d = decode("20241399/20240101/Seoul/Gangnam/East/skt/5g/MyGame/PhoneX");
    assert_eq!(d.date, "20240101");
    assert_eq!(d.city, "Seoul");
}

#[test]
fn date_segment_rules() {
    assert!(is_date_segment("20240131"));
    assert!(is_date_segment("21001231"));
    assert!(!is_date_segment("19991231"));
    assert!(!is_date_segment("20241301"));
    assert!(!is_date_segment("20240100"));
    assert!(!is_date_segment("2024011"));
    assert!(!is_date_segment("2024-1-1"));
}
