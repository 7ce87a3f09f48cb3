use std::sync::Arc;
use std::time::Duration;

use portal_core::model::{
    CourseDraft, CourseId, Employee, EmployeeId, Lesson, LessonId, LessonKind, Module, ModuleId,
};
use portal_core::time::fixed_clock;
use services::{
    ChannelObserver, CoursePlayerService, LessonCompletion, PlayerError, PlayerEvent, QuizAdvance,
};
use storage::repository::{
    CourseRepository, EmployeeRepository, InMemoryRepository, Storage, StorageError,
};

fn two_by_two() -> portal_core::model::Course {
    let lesson = |id: u64| {
        Lesson::new(LessonId::new(id), format!("Aula {id}"), "5min", LessonKind::Text)
            .unwrap()
            .with_locked(id != 1)
    };
    CourseDraft {
        id: 20,
        title: "Curso 2x2".into(),
        modules: vec![
            Module::new(ModuleId::new(1), "M1", None, vec![lesson(1), lesson(2)]).unwrap(),
            Module::new(ModuleId::new(2), "M2", None, vec![lesson(3), lesson(4)]).unwrap(),
        ],
        ..CourseDraft::default()
    }
    .validate()
    .unwrap()
}

async fn service(repo: &InMemoryRepository) -> CoursePlayerService {
    let storage = Storage::from_repository(repo.clone());
    storage::catalog::seed(&storage).await.unwrap();
    repo.upsert_course(&two_by_two()).await.unwrap();
    CoursePlayerService::new(
        fixed_clock(),
        Duration::from_millis(1000),
        storage.courses,
        storage.employees,
    )
}

#[tokio::test(start_paused = true)]
async fn two_by_two_course_progresses_by_quarters_and_records_once() {
    let repo = InMemoryRepository::new();
    let service = service(&repo).await;
    let (observer, mut events) = ChannelObserver::channel();
    let learner = EmployeeId::new(3);

    let mut player = service
        .start(CourseId::new(20), Some(learner), Arc::new(observer))
        .await
        .unwrap();

    let mut progress = vec![player.progress().percent];
    let mut completions = 0;
    loop {
        let outcome = service.complete_current_lesson(&mut player).await.unwrap();
        if outcome.course_completed() {
            completions += 1;
        }
        progress.push(player.progress().percent);
        if !player.select_next_lesson() {
            break;
        }
    }
    assert_eq!(progress, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    assert_eq!(completions, 1);

    // Repeating the last completion changes nothing.
    assert_eq!(
        service.complete_current_lesson(&mut player).await.unwrap(),
        LessonCompletion::AlreadyCompleted
    );

    let carlos = repo.get_employee(learner).await.unwrap().unwrap();
    assert_eq!(carlos.completed_courses(), 3);
    assert_eq!(repo.list_completions(learner).await.unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(1001)).await;
    assert_eq!(
        events.try_recv().unwrap(),
        PlayerEvent::CourseCompleted(CourseId::new(20))
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn anonymous_player_records_nothing() {
    let repo = InMemoryRepository::new();
    let service = service(&repo).await;
    let (observer, _events) = ChannelObserver::channel();

    let mut player = service
        .start(CourseId::new(20), None, Arc::new(observer))
        .await
        .unwrap();
    for _ in 0..4 {
        service.complete_current_lesson(&mut player).await.unwrap();
        player.select_next_lesson();
    }
    assert!(player.tracker().is_course_complete());
    assert!(repo.list_completions(EmployeeId::new(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_final_quiz_still_completes_the_lesson() {
    let repo = InMemoryRepository::new();
    let service = service(&repo).await;
    let (observer, _events) = ChannelObserver::channel();
    let learner = EmployeeId::new(1);

    let mut player = service
        .start(CourseId::new(1), Some(learner), Arc::new(observer))
        .await
        .unwrap();
    for _ in 0..5 {
        service.complete_current_lesson(&mut player).await.unwrap();
        assert!(player.select_next_lesson());
    }

    let quiz = player.quiz_mut().expect("final lesson has a quiz");
    let ids: Vec<_> = quiz.quiz().questions().iter().map(|q| q.id()).collect();
    for id in ids {
        quiz.select_answer(id, 3);
        let _ = quiz.advance();
    }
    let result = quiz.result().unwrap().clone();
    assert!(!result.passed);
    assert!(matches!(quiz.advance(), QuizAdvance::Ignored));

    let outcome = service.finish_quiz(&mut player).await.unwrap();
    assert!(outcome.course_completed());
    assert_eq!(repo.list_completions(learner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_course_is_reported() {
    let repo = InMemoryRepository::new();
    let service = service(&repo).await;
    let err = service
        .start(CourseId::new(404), None, Arc::new(services::NoopObserver))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, services::PlayerError::CourseNotFound(_)));
}

fn single_lesson() -> portal_core::model::Course {
    let lesson = Lesson::new(LessonId::new(901), "Aula única", "5min", LessonKind::Text).unwrap();
    CourseDraft {
        id: 9,
        title: "Curso curto".into(),
        modules: vec![Module::new(ModuleId::new(90), "M", None, vec![lesson]).unwrap()],
        ..CourseDraft::default()
    }
    .validate()
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn failed_completion_record_is_retried_and_announced_only_after_success() {
    let repo = InMemoryRepository::new();
    repo.upsert_course(&single_lesson()).await.unwrap();
    let storage = Storage::from_repository(repo.clone());
    let service = CoursePlayerService::new(
        fixed_clock(),
        Duration::from_millis(100),
        storage.courses,
        storage.employees,
    );
    let (observer, mut events) = ChannelObserver::channel();
    let learner = EmployeeId::new(50);

    let mut player = service
        .start(CourseId::new(9), Some(learner), Arc::new(observer))
        .await
        .unwrap();

    // The learner row is not there yet, so the record fails.
    let err = service.complete_current_lesson(&mut player).await.unwrap_err();
    assert!(matches!(err, PlayerError::Storage(StorageError::NotFound)));
    assert!(player.tracker().is_course_complete());
    assert!(!player.has_pending_completion());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.try_recv().is_err());

    let employee = Employee::new(learner, "Nova Pessoa", "nova@3ri.com.br", "Registro", "Escrevente")
        .unwrap();
    repo.upsert_employee(&employee).await.unwrap();

    let outcome = service.complete_current_lesson(&mut player).await.unwrap();
    assert!(outcome.course_completed());
    assert_eq!(repo.list_completions(learner).await.unwrap().len(), 1);
    assert_eq!(
        repo.get_employee(learner).await.unwrap().unwrap().completed_courses(),
        1
    );

    tokio::time::sleep(Duration::from_millis(101)).await;
    assert_eq!(
        events.try_recv().unwrap(),
        PlayerEvent::CourseCompleted(CourseId::new(9))
    );
    assert_eq!(
        service.complete_current_lesson(&mut player).await.unwrap(),
        LessonCompletion::AlreadyCompleted
    );
}
