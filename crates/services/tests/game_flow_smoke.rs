use quiz_core::model::ScoreTier;
use quiz_core::time::fixed_clock;
use services::session::AdvanceOutcome;
use services::GameLoopService;
use storage::repository::{InMemoryRepository, LeaderboardRepository, QuestionRecord, QuestionRepository};

#[tokio::test]
async fn full_game_persists_leaderboard_entry() {
    let repo = InMemoryRepository::new();

    let brands = [("itel.jpg", "Itel"), ("hisense.jpg", "Hisense"), ("oraimo.jpg", "Oraimo")];
    for (image, answer) in brands {
        repo.append_question(&QuestionRecord {
            date: "2024-01-20".into(),
            image: image.into(),
            canonical_answer: answer.into(),
            acceptable_answers: vec![answer.to_lowercase()],
        })
        .await
        .unwrap();
    }

    let loop_svc = GameLoopService::new(
        fixed_clock(),
        std::sync::Arc::new(repo.clone()),
        std::sync::Arc::new(repo.clone()),
    );

    let mut session = loop_svc.start_session().await.unwrap();
    session.login("Ada", "ada@example.com").unwrap();
    session.start_game().unwrap();

    // Answer two correctly, miss the last one.
    let answers = ["Itel", "hisense", "wrong"];
    loop {
        session.update_answer(answers[session.current_index()]).unwrap();
        session.submit_answer().unwrap();
        let advance = loop_svc.advance(&mut session).await.unwrap();
        if advance.outcome == AdvanceOutcome::Finished {
            assert!(advance.persist_error.is_none());
            break;
        }
    }

    assert_eq!(session.score(), 2);
    assert_eq!(session.score_tier(), ScoreTier::Enthusiast);

    let entry_id = session.entry_id().expect("entry persisted");
    let rows = repo.list_entries().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, entry_id);
    assert_eq!(rows[0].entry.name(), "Ada");
    assert_eq!(rows[0].entry.score(), 2);
    assert_eq!(rows[0].entry.max_score(), 3);

    let top = loop_svc.top_entries(10).await.unwrap();
    assert_eq!(top.len(), 1);
}
