use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["pmax", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["pmax", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pmax"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn season_accepts_iso_date() {
    let cli = Cli::try_parse_from(["pmax", "season", "--date", "2026-06-07"]).unwrap();
    let Some(Commands::Season { date }) = cli.command else {
        panic!("expected season command");
    };
    assert_eq!(date, NaiveDate::from_ymd_opt(2026, 6, 7));
}

#[test]
fn season_rejects_bad_date() {
    assert!(Cli::try_parse_from(["pmax", "season", "--date", "June 7"]).is_err());
}

#[test]
fn review_defaults() {
    let cli = Cli::try_parse_from(["pmax", "review", "--snapshot", "snap.json"]).unwrap();
    let Some(Commands::Review(args)) = cli.command else {
        panic!("expected review command");
    };
    assert_eq!(args.snapshot, std::path::PathBuf::from("snap.json"));
    assert!(args.date.is_none());
    assert!(!args.preview);
    assert!(args.out.is_none());
    assert!(args.export_dir.is_none());
    assert_eq!(args.window_days, 7);
}

#[test]
fn review_with_all_flags() {
    let cli = Cli::try_parse_from([
        "pmax",
        "review",
        "--snapshot",
        "snap.json",
        "--date",
        "2026-01-11",
        "--preview",
        "--out",
        "out.json",
        "--export-dir",
        "exports",
        "--window-days",
        "14",
    ])
    .unwrap();
    let Some(Commands::Review(args)) = cli.command else {
        panic!("expected review command");
    };
    assert!(args.preview);
    assert_eq!(args.date, NaiveDate::from_ymd_opt(2026, 1, 11));
    assert_eq!(args.window_days, 14);
    assert_eq!(args.export_dir, Some(std::path::PathBuf::from("exports")));
}

#[test]
fn review_requires_snapshot() {
    assert!(Cli::try_parse_from(["pmax", "review"]).is_err());
}

#[test]
fn verify_requires_live_snapshot() {
    assert!(Cli::try_parse_from(["pmax", "verify"]).is_err());
    let cli = Cli::try_parse_from(["pmax", "verify", "--live", "live.json"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Verify { date: None, .. })));
}

#[test]
fn images_import_takes_file() {
    let cli = Cli::try_parse_from(["pmax", "images", "import", "--file", "images.json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Images {
            command: ImagesCommands::Import { .. }
        })
    ));
}

#[test]
fn images_gaps_with_campaign_filter() {
    let cli = Cli::try_parse_from(["pmax", "images", "gaps", "--campaign", "core-brand"]).unwrap();
    let Some(Commands::Images {
        command: ImagesCommands::Gaps { campaign, notify },
    }) = cli.command
    else {
        panic!("expected images gaps command");
    };
    assert_eq!(campaign.as_deref(), Some("core-brand"));
    assert!(!notify);
}

#[test]
fn budget_history_defaults_to_eight_weeks() {
    let cli = Cli::try_parse_from(["pmax", "budget", "--campaign", "core-brand"]).unwrap();
    let Some(Commands::Budget { campaign, weeks }) = cli.command else {
        panic!("expected budget command");
    };
    assert_eq!(campaign, "core-brand");
    assert_eq!(weeks, 8);
    assert!(Cli::try_parse_from(["pmax", "budget"]).is_err());
}
