use std::sync::Arc;

use portal_core::PortalConfig;
use portal_core::model::{CourseId, EmployeeId, Feedback, View};
use portal_core::time::fixed_clock;
use services::{AppServices, NoopObserver, PortalError, PortalService};
use storage::repository::{InMemoryRepository, Storage};

async fn app(repo: &InMemoryRepository) -> AppServices {
    let storage = Storage::from_repository(repo.clone());
    storage::catalog::seed(&storage).await.unwrap();
    AppServices::from_storage(storage, fixed_clock(), PortalConfig::immediate())
}

#[tokio::test]
async fn employee_sign_in_is_remembered_across_restarts() {
    let repo = InMemoryRepository::new();
    let services = app(&repo).await;

    let mut portal = services.portal().await.unwrap();
    assert_eq!(portal.state().view(), View::Landing);
    portal.go_to_auth().await.unwrap();

    let err = portal
        .sign_in_employee("gabriel@3ri.com.br", "errada")
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::InvalidCredentials));
    assert_eq!(portal.state().view(), View::Auth);

    let joao = portal
        .sign_in_employee("Gabriel@3RI.com.br", "senha123")
        .await
        .unwrap();
    assert_eq!(joao.name(), "João Gabriel");

    let restored = services.portal().await.unwrap();
    assert_eq!(restored.state().view(), View::EmployeeDashboard);
    assert_eq!(restored.state().learner().map(|e| e.id()), Some(EmployeeId::new(1)));
}

#[tokio::test]
async fn demo_mode_cannot_open_courses_but_sees_demo_feedback() {
    let repo = InMemoryRepository::new();
    let services = app(&repo).await;
    let mut portal = services.portal().await.unwrap();

    portal.enter_demo().await.unwrap();
    let err = portal
        .open_course(CourseId::new(1), Arc::new(NoopObserver))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, PortalError::DemoRestricted));
    assert_eq!(portal.state().view(), View::Demo);

    let feedback = portal.visible_feedback().await.unwrap();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].employee_id(), EmployeeId::new(1));
}

#[tokio::test]
async fn company_sees_all_feedback_and_sign_out_clears_state() {
    let repo = InMemoryRepository::new();
    let services = app(&repo).await;
    let mut portal = services.portal().await.unwrap();

    let err = portal
        .sign_in_company("oficial@3ri.com.br", "senha123")
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::InvalidCredentials));

    portal
        .sign_in_company("oficial@3ri.com.br", "admin123")
        .await
        .unwrap();
    assert_eq!(portal.state().view(), View::CompanyDashboard);
    assert_eq!(portal.visible_feedback().await.unwrap().len(), 3);

    let err = portal
        .open_course(CourseId::new(1), Arc::new(NoopObserver))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, PortalError::NotSignedIn));

    portal.sign_out().await.unwrap();
    assert_eq!(portal.state().view(), View::Landing);
    assert!(matches!(
        portal.visible_feedback().await.unwrap_err(),
        PortalError::NotSignedIn
    ));

    let restored = services.portal().await.unwrap();
    assert_eq!(restored.state().view(), View::Landing);
    assert!(restored.state().user().is_none());
}

#[tokio::test]
async fn finishing_a_course_updates_the_signed_in_user() {
    let repo = InMemoryRepository::new();
    let services = app(&repo).await;
    let mut portal = services.portal().await.unwrap();
    portal
        .sign_in_employee("carlos.protocolo@3ri.com.br", "senha123")
        .await
        .unwrap();

    let mut player = portal
        .open_course(CourseId::new(4), Arc::new(NoopObserver))
        .await
        .unwrap();
    assert_eq!(portal.state().view(), View::CoursePlayer);
    assert_eq!(portal.state().course_id(), Some(CourseId::new(4)));

    portal.complete_current_lesson(&mut player).await.unwrap();
    assert!(player.select_next_lesson());
    let outcome = portal.complete_current_lesson(&mut player).await.unwrap();
    assert!(outcome.course_completed());
    assert_eq!(portal.state().user().unwrap().completed_courses(), 3);

    player.back();
    portal.close_course().await.unwrap();
    assert_eq!(portal.state().view(), View::EmployeeDashboard);
    assert_eq!(portal.state().course_id(), None);
}

#[tokio::test]
async fn company_registers_employees_who_can_then_sign_in() {
    let repo = InMemoryRepository::new();
    let services = app(&repo).await;
    let mut portal = services.portal().await.unwrap();
    portal
        .sign_in_company("oficial@3ri.com.br", "admin123")
        .await
        .unwrap();

    let ana = portal
        .add_employee("Ana Averbação", "ana@3ri.com.br", "Registro", "Escrevente")
        .await
        .unwrap();
    assert_eq!(ana.id(), EmployeeId::new(4));
    assert_eq!(ana.completed_courses(), 0);

    let err = portal
        .add_employee("Sem Departamento", "sem@3ri.com.br", "", "Escrevente")
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Catalog(_)));

    portal.sign_out().await.unwrap();
    let signed_in = portal
        .sign_in_employee("ana@3ri.com.br", "senha123")
        .await
        .unwrap();
    assert_eq!(signed_in.id(), EmployeeId::new(4));
}

async fn send_note(portal: &PortalService) -> Result<Feedback, PortalError> {
    portal
        .send_feedback(EmployeeId::new(3), CourseId::new(2), "Bom trabalho", 4)
        .await
}

#[tokio::test]
async fn only_the_company_can_send_feedback_or_add_employees() {
    let repo = InMemoryRepository::new();
    let services = app(&repo).await;
    let mut portal = services.portal().await.unwrap();

    assert!(matches!(send_note(&portal).await.unwrap_err(), PortalError::NotSignedIn));

    portal.enter_demo().await.unwrap();
    assert!(matches!(send_note(&portal).await.unwrap_err(), PortalError::DemoRestricted));

    portal
        .sign_in_employee("gabriel@3ri.com.br", "senha123")
        .await
        .unwrap();
    assert!(matches!(send_note(&portal).await.unwrap_err(), PortalError::CompanyOnly));
    assert!(matches!(
        portal
            .add_employee("Ana", "ana@3ri.com.br", "Registro", "Escrevente")
            .await
            .unwrap_err(),
        PortalError::CompanyOnly
    ));

    portal.sign_out().await.unwrap();
    portal
        .sign_in_company("oficial@3ri.com.br", "admin123")
        .await
        .unwrap();
    let note = send_note(&portal).await.unwrap();
    assert_eq!(note.id().value(), 4);
    assert_eq!(note.employee_name(), "Carlos Protocolo");
    assert_eq!(note.manager_name(), "Gestor da Empresa");
    assert!(!note.is_read());
    assert_eq!(portal.visible_feedback().await.unwrap().len(), 4);
}
