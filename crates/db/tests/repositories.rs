//! Repository tests against a real database.
//!
//! Each test gets a fresh database from `#[sqlx::test]` with the crate's
//! migrations applied. Run with `DATABASE_URL` set and `--ignored`.

use chrono::Utc;
use inflio_core::clip::Clip;
use inflio_core::project::ProjectStatus;
use inflio_core::task::{default_tasks, TaskStatus, TaskType};
use inflio_db::models::persona::{CreatePersona, CreatePersonaImage};
use inflio_db::models::project::{CreateProject, UpdateProject};
use inflio_db::repositories::{PersonaRepo, ProjectRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_project(title: &str) -> CreateProject {
    CreateProject {
        title: title.to_string(),
        description: None,
        video_url: "https://cdn.example.com/talk.mp4".to_string(),
        thumbnail_url: None,
        tasks: None,
    }
}

fn clip(id: &str) -> Clip {
    Clip {
        id: id.to_string(),
        title: format!("Clip {id}"),
        description: None,
        start_time: 0.0,
        end_time: 30.0,
        duration: 30.0,
        thumbnail: None,
        score: 0.8,
        score_explanation: None,
        export_url: None,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_project_crud(pool: PgPool) {
    let tasks = default_tasks(&[TaskType::Clips, TaskType::Blog]);
    let created = ProjectRepo::create(&pool, "user_1", &new_project("  Talk  "), &tasks)
        .await
        .unwrap();
    assert_eq!(created.title, "Talk");
    assert_eq!(created.status_id, ProjectStatus::Draft.id());
    assert_eq!(created.tasks.len(), 2);
    assert!(created.folders.clips.is_empty());

    let found = ProjectRepo::find_by_id(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(found.tasks.0, tasks);

    let updated = ProjectRepo::update(
        &pool,
        created.id,
        &UpdateProject {
            title: Some("Renamed".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert!(updated.updated_at >= created.updated_at);

    assert!(ProjectRepo::delete(&pool, created.id).await.unwrap());
    assert!(!ProjectRepo::delete(&pool, created.id).await.unwrap());
    assert!(ProjectRepo::find_by_id(&pool, created.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_list_by_user_is_scoped_and_paginated(pool: PgPool) {
    for title in ["a", "b", "c"] {
        ProjectRepo::create(&pool, "user_1", &new_project(title), &[])
            .await
            .unwrap();
    }
    ProjectRepo::create(&pool, "user_2", &new_project("other"), &[])
        .await
        .unwrap();

    let all = ProjectRepo::list_by_user(&pool, "user_1", None, None).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b", "a"]);

    let page = ProjectRepo::list_by_user(&pool, "user_1", Some(2), Some(1)).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "b");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_save_lifecycle_under_row_lock(pool: PgPool) {
    let project = ProjectRepo::create(
        &pool,
        "user_1",
        &new_project("Locked"),
        &default_tasks(&[TaskType::Clips]),
    )
    .await
    .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let locked = ProjectRepo::find_for_update(&mut *tx, project.id)
        .await
        .unwrap()
        .unwrap();

    let mut lifecycle = locked.lifecycle();
    lifecycle.klap_project_id = Some("J1".into());
    lifecycle.klap_folder_id = Some("F1".into());
    lifecycle.folders.clips = vec![clip("c1"), clip("c2")];
    lifecycle.tasks[0].begin().unwrap();
    lifecycle.tasks[0].complete().unwrap();
    lifecycle.status = ProjectStatus::Ready;

    let saved = ProjectRepo::save_lifecycle(&mut *tx, project.id, &lifecycle)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(saved.status_id, ProjectStatus::Ready.id());
    assert_eq!(saved.klap_project_id.as_deref(), Some("J1"));
    assert_eq!(saved.clips().len(), 2);

    let reloaded = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(reloaded.lifecycle(), lifecycle);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_list_in_flight_selects_processing_jobs(pool: PgPool) {
    let tasks = default_tasks(&[TaskType::Clips]);
    let mut ids = Vec::new();
    for (i, status) in [
        TaskStatus::Processing,
        TaskStatus::Completed,
        TaskStatus::Processing,
    ]
    .into_iter()
    .enumerate()
    {
        let project = ProjectRepo::create(&pool, "user_1", &new_project("p"), &tasks)
            .await
            .unwrap();
        let mut lifecycle = project.lifecycle();
        lifecycle.klap_project_id = Some(format!("J{i}"));
        lifecycle.tasks[0].begin().unwrap();
        if status == TaskStatus::Completed {
            lifecycle.tasks[0].complete().unwrap();
        }
        let mut conn = pool.acquire().await.unwrap();
        ProjectRepo::save_lifecycle(&mut *conn, project.id, &lifecycle)
            .await
            .unwrap();
        ids.push(project.id);
    }
    // Processing task but no vendor job: not in flight.
    let orphan = ProjectRepo::create(&pool, "user_1", &new_project("orphan"), &tasks)
        .await
        .unwrap();
    let mut lifecycle = orphan.lifecycle();
    lifecycle.tasks[0].begin().unwrap();
    let mut conn = pool.acquire().await.unwrap();
    ProjectRepo::save_lifecycle(&mut *conn, orphan.id, &lifecycle)
        .await
        .unwrap();

    let in_flight = ProjectRepo::list_in_flight(&pool, 10).await.unwrap();
    let found: Vec<i64> = in_flight.iter().map(|p| p.id).collect();
    assert_eq!(found, vec![ids[0], ids[2]]);

    let limited = ProjectRepo::list_in_flight(&pool, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_vendor_job_rejected(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    for title in ["first", "second"] {
        let project = ProjectRepo::create(&pool, "user_1", &new_project(title), &[])
            .await
            .unwrap();
        let mut lifecycle = project.lifecycle();
        lifecycle.klap_project_id = Some("J-shared".into());
        let result = ProjectRepo::save_lifecycle(&mut *conn, project.id, &lifecycle).await;
        if title == "second" {
            let err = result.unwrap_err();
            let db_err = err.as_database_error().expect("database error");
            assert_eq!(db_err.code().as_deref(), Some("23505"));
        } else {
            result.unwrap();
        }
    }
}

// ---------------------------------------------------------------------------
// Personas
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_persona_lifecycle(pool: PgPool) {
    let persona = PersonaRepo::create(
        &pool,
        "user_1",
        &CreatePersona {
            name: "Host".into(),
            description: Some("Podcast host".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(persona.status, "pending");

    let trained = PersonaRepo::update_status(&pool, persona.id, "ready")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(trained.status, "ready");

    let invalid = PersonaRepo::update_status(&pool, persona.id, "bogus").await;
    assert!(invalid.is_err());

    for url in ["https://img.example.com/1.png", "https://img.example.com/2.png"] {
        PersonaRepo::add_image(
            &pool,
            persona.id,
            &CreatePersonaImage {
                image_url: url.into(),
                prompt: None,
            },
            50,
        )
        .await
        .unwrap()
        .unwrap();
    }
    assert_eq!(PersonaRepo::count_images(&pool, persona.id).await.unwrap(), 2);
    let images = PersonaRepo::list_images(&pool, persona.id).await.unwrap();
    assert_eq!(images[0].image_url, "https://img.example.com/1.png");

    let listed = PersonaRepo::list_by_user(&pool, "user_1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(PersonaRepo::list_by_user(&pool, "user_2").await.unwrap().is_empty());

    assert!(PersonaRepo::delete(&pool, persona.id).await.unwrap());
    assert_eq!(PersonaRepo::count_images(&pool, persona.id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_image_uploads_respect_cap(pool: PgPool) {
    let persona = PersonaRepo::create(
        &pool,
        "user_1",
        &CreatePersona {
            name: "Host".into(),
            description: None,
        },
    )
    .await
    .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = pool.clone();
            let persona_id = persona.id;
            tokio::spawn(async move {
                let input = CreatePersonaImage {
                    image_url: format!("https://img.example.com/{i}.png"),
                    prompt: None,
                };
                PersonaRepo::add_image(&pool, persona_id, &input, 3).await
            })
        })
        .collect();

    let mut added = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            Some(_) => added += 1,
            None => refused += 1,
        }
    }
    assert_eq!(added, 3);
    assert_eq!(refused, 5);
    assert_eq!(PersonaRepo::count_images(&pool, persona.id).await.unwrap(), 3);
}
