use super::*;
use crate::test_support::build_test_orchestrator;
use clap::Parser;

#[derive(Parser)]
struct TestCli {
    #[command(subcommand)]
    command: ScheduleCommand,
}

#[test]
fn weekly_frequency_parses_weekday_hour_minute() {
    let cli = TestCli::try_parse_from([
        "schedule", "add", "--name", "nightly", "--device", "d1", "weekly", "--weekday", "1", "--hour", "2",
        "--minute", "30",
    ])
    .expect("parses");
    match cli.command {
        ScheduleCommand::Add(args) => match args.frequency {
            Frequency::Weekly { weekday, hour, minute } => {
                assert_eq!(weekday, 1);
                assert_eq!(hour, 2);
                assert_eq!(minute, 30);
            }
            _ => panic!("expected Weekly"),
        },
        _ => panic!("expected Add"),
    }
}

#[tokio::test]
async fn add_installs_a_job_with_a_derived_cron_expression() {
    let (_dir, orchestrator) = build_test_orchestrator().await;
    let args = AddArgs {
        name: "nightly".to_string(),
        device_ids: vec!["d1".to_string()],
        command: "show running-config".to_string(),
        frequency: Frequency::Weekly { weekday: 1, hour: 2, minute: 30 },
    };
    add(args, &orchestrator, OutputFormat::Text).await.expect("add succeeds");

    let schedules = orchestrator.list_schedules().await.expect("list_schedules");
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].cron_expression, "30 2 * * 1");
    assert!(schedules[0].next_run_at.is_some());
}

#[tokio::test]
async fn install_schedule_rejects_an_invalid_custom_cron_expression() {
    let (_dir, orchestrator) = build_test_orchestrator().await;
    let task = netcfg_core::ScheduledTask::new(
        netcfg_core::ScheduledTaskId::new("sched-bad"),
        "bad",
        netcfg_core::TaskType::Scheduled,
        FrequencyConfig::Custom { cron: "not a cron".to_string() },
        vec![netcfg_core::DeviceId::new("d1")],
        "show running-config",
        "cli",
        chrono::Utc::now(),
    );
    let err = orchestrator.install_schedule(task).await.unwrap_err();
    assert!(err.to_string().contains("five fields"));
}

#[tokio::test]
async fn remove_uninstalls_a_previously_installed_job() {
    let (_dir, orchestrator) = build_test_orchestrator().await;
    let args = AddArgs {
        name: "nightly".to_string(),
        device_ids: vec!["d1".to_string()],
        command: "show running-config".to_string(),
        frequency: Frequency::Daily { hour: 3, minute: 0 },
    };
    add(args, &orchestrator, OutputFormat::Text).await.expect("add succeeds");
    let schedules = orchestrator.list_schedules().await.expect("list_schedules");
    let id = schedules[0].id.as_str().to_string();

    remove(id, &orchestrator).await.expect("remove succeeds");
    let remaining = orchestrator.list_schedules().await.expect("list_schedules");
    assert!(remaining.is_empty());
}
