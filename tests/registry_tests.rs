// Integration tests for the in-memory session registry

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use loqa_interviews::models::{
    AiAnalysis, Difficulty, InterviewType, Role, Scores, Session, SessionStatus, TranscriptEntry,
    UserStats,
};
use loqa_interviews::registry::{Completion, MemoryRegistry, SessionRegistry, UserStatsStore};
use loqa_interviews::InterviewError;
use tempfile::TempDir;

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 27, 9, 0, 0).unwrap()
}

fn new_session(room_id: &str) -> Session {
    Session::scheduled(
        room_id.to_string(),
        "user-1".to_string(),
        "Linus".to_string(),
        InterviewType::SystemDesign,
        Difficulty::Medium,
        at(),
    )
}

fn entry(role: Role, content: &str) -> TranscriptEntry {
    TranscriptEntry {
        role,
        content: content.to_string(),
        timestamp: at(),
    }
}

fn completion(scores: Scores) -> Completion {
    Completion {
        end_time: at() + Duration::seconds(300),
        duration: 300,
        scores,
        ai_analysis: AiAnalysis {
            strengths: vec![],
            weaknesses: vec![],
            recommendations: vec![],
            code_review: String::new(),
            communication_feedback: String::new(),
            technical_feedback: String::new(),
            overall_feedback: "done".to_string(),
            detailed_report: String::new(),
            generated_at: at(),
        },
        transcript: None,
        code: None,
        recording_url: None,
    }
}

#[tokio::test]
async fn test_duplicate_room_is_rejected() -> Result<()> {
    let registry = MemoryRegistry::new();
    registry.create(new_session("room-a")).await?;

    let result = registry.create(new_session("room-a")).await;
    assert!(matches!(result, Err(InterviewError::DuplicateRoom(room)) if room == "room-a"));

    Ok(())
}

#[tokio::test]
async fn test_unknown_room_is_not_found() -> Result<()> {
    let registry = MemoryRegistry::new();

    assert!(matches!(
        registry.get("missing").await,
        Err(InterviewError::NotFound(_))
    ));
    assert!(matches!(
        registry.replace_transcript("missing", Vec::new()).await,
        Err(InterviewError::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_transcript_replacement_never_duplicates() -> Result<()> {
    let registry = MemoryRegistry::new();
    registry.create(new_session("room-a")).await?;
    registry.start("room-a", None, at()).await?;

    let transcript = vec![
        entry(Role::Agent, "Design a URL shortener."),
        entry(Role::User, "I would start with the write path."),
    ];

    registry
        .replace_transcript("room-a", transcript.clone())
        .await?;
    registry
        .replace_transcript("room-a", transcript.clone())
        .await?;

    assert_eq!(registry.get("room-a").await?.transcript, transcript);

    Ok(())
}

#[tokio::test]
async fn test_mutations_require_in_progress() -> Result<()> {
    let registry = MemoryRegistry::new();
    registry.create(new_session("room-a")).await?;

    // Scheduled: no live mutations yet
    let early = registry
        .replace_transcript("room-a", vec![entry(Role::User, "hello")])
        .await;
    assert!(matches!(
        early,
        Err(InterviewError::Conflict {
            status: SessionStatus::Scheduled,
            ..
        })
    ));

    registry.start("room-a", Some("call-1".to_string()), at()).await?;

    let final_scores = Scores {
        code_quality: 70,
        communication: 60,
        problem_solving: 80,
        technical_knowledge: 90,
        confidence: 50,
        overall: 75,
    };
    let completed = registry.complete("room-a", completion(final_scores)).await?;
    assert_eq!(completed.status, SessionStatus::Completed);
    assert_eq!(completed.duration, Some(300));

    let late_scores = registry.update_scores("room-a", Scores::default()).await;
    assert!(matches!(late_scores, Err(InterviewError::Conflict { .. })));

    let second = registry.complete("room-a", completion(Scores::default())).await;
    assert!(matches!(second, Err(InterviewError::Conflict { .. })));

    let cancel = registry.cancel("room-a", at()).await;
    assert!(matches!(cancel, Err(InterviewError::Conflict { .. })));

    assert_eq!(registry.get("room-a").await?.scores, final_scores);

    Ok(())
}

#[tokio::test]
async fn test_start_keeps_first_call_id() -> Result<()> {
    let registry = MemoryRegistry::new();
    registry.create(new_session("room-a")).await?;

    let first = registry.start("room-a", Some("call-1".to_string()), at()).await?;
    assert!(first.transitioned);

    let later = at() + Duration::seconds(5);
    let second = registry.start("room-a", Some("call-2".to_string()), later).await?;
    assert!(!second.transitioned);
    assert_eq!(second.session.external_call_id.as_deref(), Some("call-1"));
    assert_eq!(second.session.start_time, Some(at()));

    Ok(())
}

#[tokio::test]
async fn test_list_by_owner_is_newest_first() -> Result<()> {
    let registry = MemoryRegistry::new();

    let mut older = new_session("room-old");
    older.created_at = at() - Duration::hours(1);
    registry.create(older).await?;
    registry.create(new_session("room-new")).await?;

    let mut foreign = new_session("room-foreign");
    foreign.owner_id = "user-2".to_string();
    registry.create(foreign).await?;

    let rooms: Vec<String> = registry
        .list_by_owner("user-1")
        .await?
        .into_iter()
        .map(|s| s.room_id)
        .collect();
    assert_eq!(rooms, vec!["room-new", "room-old"]);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("registry.json");

    {
        let registry = MemoryRegistry::open(&path).await?;
        registry.create(new_session("room-a")).await?;
        registry.start("room-a", None, at()).await?;
        registry
            .replace_transcript("room-a", vec![entry(Role::User, "persist me")])
            .await?;
        registry
            .modify("user-1", &|_| UserStats {
                total_interviews: 7,
                ..UserStats::default()
            })
            .await?;
    }

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reopened = MemoryRegistry::open(&path).await?;
    let session = reopened.get("room-a").await?;
    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.transcript.len(), 1);
    assert_eq!(
        reopened.load("user-1").await?.map(|s| s.total_interviews),
        Some(7)
    );

    Ok(())
}

#[tokio::test]
async fn test_corrupt_snapshot_is_a_storage_error() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("registry.json");
    std::fs::write(&path, b"{ not json")?;

    let result = MemoryRegistry::open(&path).await;
    assert!(matches!(result, Err(InterviewError::Storage(_))));

    Ok(())
}

#[tokio::test]
async fn test_failed_write_leaves_memory_unchanged() -> Result<()> {
    let dir = TempDir::new()?;
    let data = dir.path().join("data");
    std::fs::create_dir(&data)?;
    let registry = MemoryRegistry::open(data.join("registry.json")).await?;

    registry.create(new_session("room-a")).await?;
    registry.start("room-a", None, at()).await?;
    registry
        .replace_transcript("room-a", vec![entry(Role::User, "kept")])
        .await?;

    std::fs::remove_dir_all(&data)?;

    let result = registry.complete("room-a", completion(Scores::default())).await;
    assert!(matches!(result, Err(InterviewError::Storage(_))));

    let result = registry
        .replace_transcript("room-a", vec![entry(Role::User, "lost")])
        .await;
    assert!(matches!(result, Err(InterviewError::Storage(_))));

    let result = registry.create(new_session("room-b")).await;
    assert!(matches!(result, Err(InterviewError::Storage(_))));

    let result = registry
        .modify("user-1", &|_| UserStats {
            total_interviews: 1,
            ..UserStats::default()
        })
        .await;
    assert!(matches!(result, Err(InterviewError::Storage(_))));

    let session = registry.get("room-a").await?;
    assert_eq!(session.status, SessionStatus::InProgress);
    assert!(session.ai_analysis.is_none());
    assert_eq!(session.transcript[0].content, "kept");
    assert!(matches!(
        registry.get("room-b").await,
        Err(InterviewError::NotFound(_))
    ));
    assert!(registry.load("user-1").await?.is_none());

    Ok(())
}
