use std::time::Duration;

use quiz_core::model::ScoreTier;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::progress::SessionProgress;
use super::service::{AdvanceOutcome, AnswerEvaluation, GameSession, TickOutcome};
use super::workflow::GameLoopService;
use crate::error::SessionError;

/// Pause between answer evaluation and the next question, so the
/// correct/incorrect feedback stays visible.
pub const ADVANCE_DELAY: Duration = Duration::from_secs(2);

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Placeholder deadline for a disarmed timer; its branch is never polled.
fn idle_deadline() -> Instant {
    Instant::now() + Duration::from_secs(60 * 60 * 24)
}

//
// ─── EVENTS AND COMMANDS ───────────────────────────────────────────────────────
//

/// Notifications streamed to the UI shell.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The countdown stepped; seconds left on the current question.
    Tick { remaining: u32 },
    /// An answer (manual or timed out) was evaluated.
    Evaluated { evaluation: AnswerEvaluation },
    /// The session moved to the question at `index`.
    QuestionChanged { index: usize },
    /// The session finished; `entry_id` is absent when the leaderboard write
    /// failed.
    Finished {
        score: u32,
        total: usize,
        tier: ScoreTier,
        entry_id: Option<i64>,
    },
    /// The end-of-session leaderboard write failed.
    PersistFailed { message: String },
}

enum Command {
    Login {
        name: String,
        email: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    StartGame {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    UpdateAnswer {
        text: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Submit {
        reply: oneshot::Sender<Result<AnswerEvaluation, SessionError>>,
    },
    ResetToStart {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Progress {
        reply: oneshot::Sender<SessionProgress>,
    },
}

//
// ─── HANDLE ────────────────────────────────────────────────────────────────────
//

/// Cheap, cloneable front for a spawned [`SessionDriver`].
///
/// Dropping every handle stops the driver task.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .map_err(|_| SessionError::DriverStopped)?;
        rx.await.map_err(|_| SessionError::DriverStopped)
    }

    /// Capture the player identity.
    ///
    /// # Errors
    ///
    /// Propagates session validation/transition errors, or
    /// `SessionError::DriverStopped` if the driver task is gone.
    pub async fn login(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<(), SessionError> {
        let name = name.into();
        let email = email.into();
        self.call(move |reply| Command::Login { name, email, reply })
            .await?
    }

    /// Start (or restart) play; arms a fresh countdown.
    ///
    /// # Errors
    ///
    /// Propagates session transition errors, or `SessionError::DriverStopped`.
    pub async fn start_game(&self) -> Result<(), SessionError> {
        self.call(|reply| Command::StartGame { reply }).await?
    }

    /// Replace the in-progress answer text.
    ///
    /// # Errors
    ///
    /// Propagates session transition errors, or `SessionError::DriverStopped`.
    pub async fn update_answer(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = text.into();
        self.call(move |reply| Command::UpdateAnswer { text, reply })
            .await?
    }

    /// Submit the current answer; on success the advance delay is scheduled.
    ///
    /// # Errors
    ///
    /// Propagates session validation/transition errors, or
    /// `SessionError::DriverStopped`.
    pub async fn submit(&self) -> Result<AnswerEvaluation, SessionError> {
        self.call(|reply| Command::Submit { reply }).await?
    }

    /// Return from the finish screen to the start screen.
    ///
    /// # Errors
    ///
    /// Propagates session transition errors, or `SessionError::DriverStopped`.
    pub async fn reset_to_start(&self) -> Result<(), SessionError> {
        self.call(|reply| Command::ResetToStart { reply }).await?
    }

    /// Snapshot the current session progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DriverStopped` if the driver task is gone.
    pub async fn progress(&self) -> Result<SessionProgress, SessionError> {
        self.call(|reply| Command::Progress { reply }).await
    }
}

//
// ─── DRIVER ────────────────────────────────────────────────────────────────────
//

/// Owns a [`GameSession`] and its two time-driven triggers.
///
/// The question countdown and the post-answer advance delay are modelled as
/// deadline state inside one `select!` loop: arming a timer replaces the
/// previous deadline, so a stale countdown can never fire into a new question
/// or a restarted game. Commands arrive over a channel and each transition
/// runs to completion before the next event is looked at.
pub struct SessionDriver {
    workflow: GameLoopService,
    session: GameSession,
    events: mpsc::UnboundedSender<SessionEvent>,
    question_deadline: Option<Instant>,
    advance_deadline: Option<Instant>,
}

impl SessionDriver {
    /// Spawn the driver task and return a handle to it.
    #[must_use]
    pub fn spawn(
        workflow: GameLoopService,
        session: GameSession,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> SessionHandle {
        let (commands, rx) = mpsc::unbounded_channel();
        let driver = Self {
            workflow,
            session,
            events,
            question_deadline: None,
            advance_deadline: None,
        };
        tokio::spawn(driver.run(rx));
        SessionHandle { commands }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let question_at = self.question_deadline.unwrap_or_else(idle_deadline);
            let advance_at = self.advance_deadline.unwrap_or_else(idle_deadline);

            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        // Every handle dropped: the session is abandoned.
                        None => break,
                    }
                }
                () = tokio::time::sleep_until(question_at),
                    if self.question_deadline.is_some() =>
                {
                    self.on_question_timer();
                }
                () = tokio::time::sleep_until(advance_at),
                    if self.advance_deadline.is_some() =>
                {
                    self.on_advance_timer().await;
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Login { name, email, reply } => {
                let _ = reply.send(self.session.login(name, email));
            }
            Command::StartGame { reply } => {
                // Disarm timers from any previous game before play begins.
                self.question_deadline = None;
                self.advance_deadline = None;
                let res = self.session.start_game();
                if res.is_ok() {
                    self.question_deadline = Some(Instant::now() + TICK_INTERVAL);
                    self.emit(SessionEvent::QuestionChanged { index: 0 });
                }
                let _ = reply.send(res);
            }
            Command::UpdateAnswer { text, reply } => {
                let _ = reply.send(self.session.update_answer(text));
            }
            Command::Submit { reply } => {
                let res = self.session.submit_answer();
                if let Ok(evaluation) = &res {
                    self.question_deadline = None;
                    self.advance_deadline = Some(Instant::now() + ADVANCE_DELAY);
                    self.emit(SessionEvent::Evaluated {
                        evaluation: evaluation.clone(),
                    });
                }
                let _ = reply.send(res);
            }
            Command::ResetToStart { reply } => {
                let res = self.session.reset_to_start();
                if res.is_ok() {
                    self.question_deadline = None;
                    self.advance_deadline = None;
                }
                let _ = reply.send(res);
            }
            Command::Progress { reply } => {
                let _ = reply.send(self.session.progress());
            }
        }
    }

    fn on_question_timer(&mut self) {
        match self.session.tick() {
            Ok(TickOutcome::Counting(remaining)) => {
                self.question_deadline = Some(Instant::now() + TICK_INTERVAL);
                self.emit(SessionEvent::Tick { remaining });
            }
            Ok(TickOutcome::Expired(evaluation)) => {
                self.question_deadline = None;
                self.advance_deadline = Some(Instant::now() + ADVANCE_DELAY);
                self.emit(SessionEvent::Evaluated { evaluation });
            }
            Err(_) => {
                // Stale timer after a state change; drop it.
                self.question_deadline = None;
            }
        }
    }

    async fn on_advance_timer(&mut self) {
        self.advance_deadline = None;
        // A stale advance timer is simply dropped.
        let Ok(advance) = self.workflow.advance(&mut self.session).await else {
            return;
        };

        match advance.outcome {
            AdvanceOutcome::NextQuestion { index } => {
                self.question_deadline = Some(Instant::now() + TICK_INTERVAL);
                self.emit(SessionEvent::QuestionChanged { index });
            }
            AdvanceOutcome::Finished => {
                if let Some(err) = advance.persist_error {
                    self.emit(SessionEvent::PersistFailed {
                        message: err.to_string(),
                    });
                }
                self.emit(SessionEvent::Finished {
                    score: self.session.score(),
                    total: self.session.total_questions(),
                    tier: self.session.score_tier(),
                    entry_id: advance.entry_id,
                });
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // A disappeared UI shell is not the driver's problem.
        let _ = self.events.send(event);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionBank, QuestionId};
    use quiz_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::repository::{InMemoryRepository, LeaderboardRepository};

    fn build_bank(answers: &[&str]) -> QuestionBank {
        let questions = answers
            .iter()
            .enumerate()
            .map(|(i, a)| {
                Question::new(
                    QuestionId::new(i as u64 + 1),
                    format!("brand-{i}.jpg"),
                    *a,
                    vec![(*a).to_string()],
                )
                .unwrap()
            })
            .collect();
        QuestionBank::new(questions).unwrap()
    }

    fn spawn_driver(
        repo: &InMemoryRepository,
        answers: &[&str],
        duration: u32,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let workflow = GameLoopService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
        .with_question_duration(duration);
        let session = workflow.session_from_bank(build_bank(answers));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (SessionDriver::spawn(workflow, session, events_tx), events_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expiry_scores_as_empty_submit_and_finishes() {
        let repo = InMemoryRepository::new();
        let (handle, mut events) = spawn_driver(&repo, &["itel"], 2);

        handle.login("Ada", "a@x.com").await.unwrap();
        handle.start_game().await.unwrap();

        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::QuestionChanged { index: 0 })
        ));
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Tick { remaining: 1 })
        ));
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Tick { remaining: 0 })
        ));
        match events.recv().await {
            Some(SessionEvent::Evaluated { evaluation }) => {
                assert!(!evaluation.correct);
                assert_eq!(evaluation.correct_answer, "itel");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match events.recv().await {
            Some(SessionEvent::Finished {
                score: 0,
                total: 1,
                entry_id: Some(_),
                ..
            }) => {}
            other => panic!("unexpected event: {other:?}"),
        }

        let rows = repo.list_entries().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.score(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_cancels_countdown_and_advances_after_delay() {
        let repo = InMemoryRepository::new();
        let (handle, mut events) = spawn_driver(&repo, &["itel", "hisense"], 15);

        handle.login("Ada", "a@x.com").await.unwrap();
        handle.start_game().await.unwrap();
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::QuestionChanged { index: 0 })
        ));

        handle.update_answer("ITEL ").await.unwrap();
        let evaluation = handle.submit().await.unwrap();
        assert!(evaluation.correct);

        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Evaluated { .. })
        ));
        // The cancelled countdown emits no further ticks; the next event is
        // the advance after the display delay.
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::QuestionChanged { index: 1 })
        ));
        // And the new question runs its own countdown.
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Tick { remaining: 14 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn replay_runs_a_fresh_countdown_and_persists_again() {
        let repo = InMemoryRepository::new();
        let (handle, mut events) = spawn_driver(&repo, &["itel"], 1);

        handle.login("Ada", "a@x.com").await.unwrap();

        for _ in 0..2 {
            handle.start_game().await.unwrap();
            assert!(matches!(
                events.recv().await,
                Some(SessionEvent::QuestionChanged { index: 0 })
            ));
            assert!(matches!(
                events.recv().await,
                Some(SessionEvent::Tick { remaining: 0 })
            ));
            assert!(matches!(
                events.recv().await,
                Some(SessionEvent::Evaluated { .. })
            ));
            assert!(matches!(
                events.recv().await,
                Some(SessionEvent::Finished { .. })
            ));
        }

        // Each completed play-through appended its own entry.
        let rows = repo.list_entries().await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_snapshot_tracks_the_countdown() {
        let repo = InMemoryRepository::new();
        let (handle, mut events) = spawn_driver(&repo, &["itel"], 15);

        handle.login("Ada", "a@x.com").await.unwrap();
        handle.start_game().await.unwrap();
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::QuestionChanged { index: 0 })
        ));
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Tick { remaining: 14 })
        ));

        let progress = handle.progress().await.unwrap();
        assert_eq!(progress.total, 1);
        assert_eq!(progress.time_remaining, 14);
        assert!(!progress.is_complete);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_commands_leave_the_driver_running() {
        let repo = InMemoryRepository::new();
        let (handle, mut events) = spawn_driver(&repo, &["itel"], 15);

        // Start before login is rejected without killing the task.
        assert!(matches!(
            handle.start_game().await,
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            handle.submit().await,
            Err(SessionError::InvalidTransition { .. })
        ));

        handle.login("Ada", "a@x.com").await.unwrap();
        handle.start_game().await.unwrap();
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::QuestionChanged { index: 0 })
        ));

        // Manual empty submit stays rejected; the countdown keeps going.
        assert!(matches!(handle.submit().await, Err(SessionError::EmptyAnswer)));
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Tick { remaining: 14 })
        ));
    }
}
