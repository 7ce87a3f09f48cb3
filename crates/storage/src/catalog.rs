//! Static catalog of the 3RI training portal.
//!
//! These definitions are the built-in data set: they back the in-memory
//! store and seed a fresh SQLite database.

use chrono::NaiveDate;
use portal_core::model::{
    Course, CourseDraft, CourseId, Employee, EmployeeId, Feedback, FeedbackId, Lesson, LessonId,
    LessonKind, Module, ModuleId, Question, QuestionId, Quiz,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Catalog(#[from] portal_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a seeding pass wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub courses: usize,
    pub employees: usize,
    pub feedback: usize,
}

fn lesson(id: u64, title: &str, duration: &str, kind: LessonKind) -> Result<Lesson, portal_core::Error> {
    // Only the opening lesson of a course starts unlocked.
    Ok(Lesson::new(LessonId::new(id), title, duration, kind)?.with_locked(id % 100 != 1))
}

fn question(
    id: u64,
    prompt: &str,
    options: &[&str],
    correct: usize,
    points: u32,
) -> Result<Question, portal_core::Error> {
    let options = options.iter().map(|o| (*o).to_owned()).collect();
    Ok(Question::new(QuestionId::new(id), prompt, options, correct, points)?)
}

fn quiz_lesson(
    id: u64,
    title: &str,
    duration: &str,
    questions: Vec<Question>,
) -> Result<Lesson, portal_core::Error> {
    Ok(lesson(id, title, duration, LessonKind::Quiz)?.with_quiz(Quiz::new(questions)?)?)
}

fn module(
    id: u64,
    title: &str,
    description: Option<&str>,
    lessons: Vec<Lesson>,
) -> Result<Module, portal_core::Error> {
    Ok(Module::new(
        ModuleId::new(id),
        title,
        description.map(str::to_owned),
        lessons,
    )?)
}

fn registry_procedures() -> Result<Course, portal_core::Error> {
    let final_quiz = vec![
        question(
            1,
            "Qual ato garante a prioridade do título apresentado?",
            &["A certidão", "A prenotação", "A averbação", "O arquivamento"],
            1,
            10,
        )?
        .with_explanation("A prenotação no protocolo assegura a prioridade do título."),
        question(
            2,
            "Qual é o prazo geral de validade da prenotação?",
            &["10 dias", "20 dias", "30 dias", "60 dias"],
            1,
            10,
        )?,
        question(
            3,
            "Quando o título não pode ser registrado, o que o oficial expede?",
            &["Nota devolutiva", "Certidão negativa", "Averbação", "Edital"],
            0,
            15,
        )?,
        question(
            4,
            "Em qual livro são feitas as matrículas dos imóveis?",
            &["Livro 1", "Livro 2", "Livro 3", "Livro 4"],
            1,
            15,
        )?,
        question(
            5,
            "O que é a qualificação registral?",
            &[
                "A cobrança de emolumentos",
                "A digitalização do título",
                "O exame da legalidade do título",
                "A entrega da certidão",
            ],
            2,
            20,
        )?,
    ];

    Ok(CourseDraft {
        id: 1,
        title: "Procedimentos de Registro de Imóveis".into(),
        description:
            "Fluxo da matrícula no 3RI: protocolo, qualificação, registro e expedição de certidões"
                .into(),
        instructor: "Equipe Registral 3RI".into(),
        duration: "6h".into(),
        level: "Avançado".into(),
        modules: vec![
            module(
                11,
                "Protocolo e Prenotação",
                Some("Entrada do título e ordem de prioridade"),
                vec![
                    lesson(101, "Boas-vindas ao fluxo registral", "8min", LessonKind::Video)?
                        .with_video_url("https://videos.3ri.com.br/fluxo-registral.mp4"),
                    lesson(102, "Prenotação e ordem de protocolo", "15min", LessonKind::Text)?
                        .with_content(
                            "Todo título apresentado recebe número de ordem no Livro 1 \
                             e prioridade a partir da prenotação.",
                        ),
                    lesson(103, "Exercício: protocolando um título", "20min", LessonKind::Exercise)?
                        .with_content("Preencha o protocolo de uma escritura de compra e venda."),
                ],
            )?,
            module(
                12,
                "Qualificação Registral",
                None,
                vec![
                    lesson(104, "Qualificação positiva e negativa", "12min", LessonKind::Video)?,
                    lesson(105, "Redigindo a nota devolutiva", "18min", LessonKind::Text)?
                        .with_content("A nota devolutiva deve indicar todas as exigências de uma só vez."),
                ],
            )?,
            module(
                13,
                "Avaliação",
                Some("Questionário final do curso"),
                vec![quiz_lesson(106, "Questionário final", "25min", final_quiz)?],
            )?,
        ],
    }
    .validate()?)
}

fn public_service() -> Result<Course, portal_core::Error> {
    let quiz = vec![
        question(
            1,
            "Qual informação deve ser confirmada primeiro no balcão?",
            &["O número do protocolo", "O horário de almoço", "O nome do oficial"],
            0,
            10,
        )?,
        question(
            2,
            "Como orientar um usuário sobre exigências pendentes?",
            &[
                "Pedir que volte outro dia",
                "Explicar a nota devolutiva com clareza",
                "Encaminhar ao tabelionato",
            ],
            1,
            10,
        )?,
        question(
            3,
            "Qual canal registra solicitações por telefone?",
            &["Livro de visitas", "Sistema de atendimento", "Agenda pessoal"],
            1,
            10,
        )?,
    ];

    Ok(CourseDraft {
        id: 2,
        title: "Atendimento ao Público em Cartório".into(),
        description: "Boas práticas de atendimento presencial e telefônico no 3º Registro de \
                      Imóveis de São Luís/MA"
            .into(),
        instructor: "Coordenação de Atendimento 3RI".into(),
        duration: "5h".into(),
        level: "Intermediário".into(),
        modules: vec![
            module(
                21,
                "Atendimento presencial",
                None,
                vec![
                    lesson(201, "Recepção e triagem", "10min", LessonKind::Video)?,
                    lesson(202, "Comunicação clara com o usuário", "15min", LessonKind::Text)?,
                ],
            )?,
            module(
                22,
                "Atendimento telefônico",
                None,
                vec![
                    lesson(203, "Roteiro de ligação", "10min", LessonKind::Video)?,
                    quiz_lesson(204, "Verificação de aprendizagem", "10min", quiz)?,
                ],
            )?,
        ],
    }
    .validate()?)
}

fn internal_rules() -> Result<Course, portal_core::Error> {
    let quiz = vec![
        question(
            1,
            "Quem edita os provimentos aplicáveis aos cartórios?",
            &["A Corregedoria", "O município", "O próprio cartório"],
            0,
            50,
        )?,
        question(
            2,
            "Padronizações internas devem ser consultadas onde?",
            &["No manual interno do 3RI", "Em redes sociais", "Em blogs jurídicos"],
            0,
            50,
        )?,
    ];

    Ok(CourseDraft {
        id: 3,
        title: "Normas da Corregedoria e Rotinas Internas".into(),
        description: "Principais provimentos, orientações da Corregedoria e padronizações \
                      internas do 3RI"
            .into(),
        instructor: "Oficial do 3RI".into(),
        duration: "8h".into(),
        level: "Avançado".into(),
        modules: vec![module(
            31,
            "Provimentos e padronização",
            None,
            vec![
                lesson(301, "Panorama dos provimentos", "30min", LessonKind::Text)?,
                quiz_lesson(302, "Questionário de normas", "15min", quiz)?,
            ],
        )?],
    }
    .validate()?)
}

fn certificates() -> Result<Course, portal_core::Error> {
    Ok(CourseDraft {
        id: 4,
        title: "Certidões, Matrículas e Averbações".into(),
        description: "Emissão de certidões, leitura de matrículas e principais tipos de averbações"
            .into(),
        instructor: "Equipe de Certidões 3RI".into(),
        duration: "4h".into(),
        level: "Básico".into(),
        modules: vec![module(
            41,
            "Leitura de matrícula",
            None,
            vec![
                lesson(401, "Estrutura da matrícula", "12min", LessonKind::Video)?,
                lesson(402, "Exercício: identificando averbações", "20min", LessonKind::Exercise)?,
            ],
        )?],
    }
    .validate()?)
}

fn protocol_deadlines() -> Result<Course, portal_core::Error> {
    Ok(CourseDraft {
        id: 5,
        title: "Gestão de Protocolo e Prazos Legais".into(),
        description: "Organização do protocolo, controle de prazos e comunicação com o usuário \
                      externo"
            .into(),
        instructor: "Supervisão de Protocolo 3RI".into(),
        duration: "6h".into(),
        level: "Intermediário".into(),
        modules: vec![module(
            51,
            "Prazos",
            None,
            vec![
                lesson(501, "Contagem de prazos", "15min", LessonKind::Text)?,
                lesson(502, "Prorrogação e cancelamento da prenotação", "15min", LessonKind::Text)?,
            ],
        )?],
    }
    .validate()?)
}

/// The five courses of the portal, ordered by ID.
///
/// # Errors
///
/// Returns `portal_core::Error` if a built-in definition fails validation.
pub fn courses() -> Result<Vec<Course>, portal_core::Error> {
    Ok(vec![
        registry_procedures()?,
        public_service()?,
        internal_rules()?,
        certificates()?,
        protocol_deadlines()?,
    ])
}

/// Employees registered by the office.
///
/// # Errors
///
/// Returns `portal_core::Error` if a built-in definition fails validation.
pub fn employees() -> Result<Vec<Employee>, portal_core::Error> {
    Ok(vec![
        Employee::new(
            EmployeeId::new(1),
            "João Gabriel",
            "gabriel@3ri.com.br",
            "Atendimento",
            "Escrevente",
        )?
        .with_completed_courses(1),
        Employee::new(
            EmployeeId::new(2),
            "Marina Matrículas",
            "marina.matriculas@3ri.com.br",
            "Registro",
            "Escrevente Substituta",
        )?
        .with_completed_courses(3),
        Employee::new(
            EmployeeId::new(3),
            "Carlos Protocolo",
            "carlos.protocolo@3ri.com.br",
            "Protocolo",
            "Auxiliar de Protocolo",
        )?
        .with_completed_courses(2),
    ])
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Feedback already sent before the portal went live.
///
/// # Errors
///
/// Returns `portal_core::Error` if a built-in definition fails validation.
pub fn feedback() -> Result<Vec<Feedback>, portal_core::Error> {
    let entries = [
        (
            1,
            1,
            "João Silva",
            1,
            "Procedimentos de Registro de Imóveis",
            "Excelente desempenho no módulo de procedimentos de registro. Você demonstrou boa \
             compreensão do fluxo da matrícula. Continue assim!",
            5,
            date(2025, 1, 20),
            false,
        ),
        (
            2,
            2,
            "Marina Matrículas",
            1,
            "Procedimentos de Registro de Imóveis",
            "Ótimo aproveitamento dos conteúdos. A aplicação prática nas qualificações do dia a \
             dia tem sido muito consistente.",
            5,
            date(2025, 1, 18),
            true,
        ),
        (
            3,
            2,
            "Marina Matrículas",
            2,
            "Atendimento ao Público em Cartório",
            "Muito bom desenvolvimento nas técnicas de atendimento ao público. Continue \
             reforçando a clareza das orientações aos usuários.",
            4,
            date(2025, 1, 15),
            true,
        ),
    ];

    entries
        .into_iter()
        .map(
            |(id, employee, employee_name, course, course_name, message, rating, date, read)| {
                Feedback::from_persisted(
                    FeedbackId::new(id),
                    EmployeeId::new(employee),
                    employee_name.to_owned(),
                    CourseId::new(course),
                    course_name.to_owned(),
                    "Oficial do 3RI".to_owned(),
                    message.to_owned(),
                    rating,
                    date,
                    read,
                )
                .map_err(portal_core::Error::from)
            },
        )
        .collect()
}

/// Write the catalog into a storage backend.
///
/// Courses are always refreshed; employees and feedback are only added when
/// missing so progress recorded since the last seed is kept.
///
/// # Errors
///
/// Returns `SeedError` if the catalog is invalid or storage fails.
pub async fn seed(storage: &Storage) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for course in courses()? {
        storage.courses.upsert_course(&course).await?;
        report.courses += 1;
    }

    for employee in employees()? {
        if storage.employees.get_employee(employee.id()).await?.is_none() {
            storage.employees.upsert_employee(&employee).await?;
            report.employees += 1;
        } else {
            debug!(employee_id = %employee.id(), "employee already present, keeping stored record");
        }
    }

    if storage.feedback.list_feedback().await?.is_empty() {
        for item in feedback()? {
            storage.feedback.insert_feedback(&item).await?;
            report.feedback += 1;
        }
    }

    info!(
        courses = report.courses,
        employees = report.employees,
        feedback = report.feedback,
        "catalog seeded"
    );
    Ok(report)
}

impl Storage {
    /// In-memory storage preloaded with the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if the catalog is invalid.
    pub async fn seeded_in_memory() -> Result<Self, SeedError> {
        let storage = Self::in_memory();
        seed(&storage).await?;
        Ok(storage)
    }
}
