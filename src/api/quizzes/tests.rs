use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

fn quiz_payload(title: &str, categories: &[i64]) -> serde_json::Value {
    json!({
        "title": title,
        "categories": categories,
        "questions": [
            {
                "title": "Which answers are correct?",
                "answers": [
                    {"answer_text": "first", "is_correct": true},
                    {"answer_text": "second", "is_correct": true},
                    {"answer_text": "third", "is_correct": true},
                    {"answer_text": "fourth", "is_correct": false}
                ]
            }
        ]
    })
}

#[tokio::test]
async fn create_assigns_identifiers_and_owner() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let category = test_support::insert_category(&ctx.state, "History").await;
    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes",
            Some(&token),
            Some(quiz_payload("WW2 Quiz", &[category.identifier.unwrap()])),
        ))
        .await
        .expect("create");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["identifier"], 1);
    assert_eq!(created["owner"], "alice@example.com");
    assert_eq!(created["questions"][0]["identifier"], 1);
    let answer_ids: Vec<i64> = created["questions"][0]["answers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|answer| answer["identifier"].as_i64().unwrap())
        .collect();
    assert_eq!(answer_ids, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn unknown_category_is_404() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes",
            Some(&token),
            Some(quiz_payload("WW2 Quiz", &[42])),
        ))
        .await
        .expect("create");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Category 42 does not exist");
}

#[tokio::test]
async fn at_most_three_categories_per_quiz() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let mut ids = Vec::new();
    for title in ["History", "Science", "Math", "Art"] {
        ids.push(test_support::insert_category(&ctx.state, title).await.identifier.unwrap());
    }
    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes",
            Some(&token),
            Some(quiz_payload("Too broad", &ids)),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes",
            Some(&token),
            Some(quiz_payload("Just right", &ids[..3])),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn structural_rules_reject_bad_quizzes() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let no_questions = json!({"title": "Empty quiz", "questions": []});
    let no_correct_answer = json!({
        "title": "Hopeless quiz",
        "questions": [{
            "title": "Pick one",
            "answers": [
                {"answer_text": "a", "is_correct": false},
                {"answer_text": "b", "is_correct": false}
            ]
        }]
    });

    for payload in [no_questions, no_correct_answer] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/quizzes",
                Some(&token),
                Some(payload),
            ))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn only_the_owner_may_update_or_delete() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    test_support::insert_user(&ctx.state, "mallory@example.com", "Str0ng!pass").await;
    let quiz = test_support::insert_quiz(&ctx.state, "alice@example.com", "WW2", vec![]).await;
    let uri = format!("/api/v1/quizzes/{}", quiz.identifier.unwrap());
    let intruder = test_support::bearer_token("mallory@example.com", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &uri,
            Some(&intruder),
            Some(quiz_payload("Stolen quiz", &[])),
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::DELETE, &uri, Some(&intruder), None))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The quiz is untouched and still readable by anyone authenticated.
    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&intruder), None))
        .await
        .expect("get");
    let body = test_support::read_json(response).await;
    assert_eq!(body["title"], "WW2");
    assert_eq!(body["owner"], "alice@example.com");
}

#[tokio::test]
async fn update_keeps_identity_and_reissues_nested_identifiers() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let quiz = test_support::insert_quiz(&ctx.state, "alice@example.com", "WW2", vec![]).await;
    let quiz_id = quiz.identifier.unwrap();
    let old_question_id = quiz.questions[0].identifier.unwrap();
    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/quizzes/{quiz_id}"),
            Some(&token),
            Some(quiz_payload("WW2 revised", &[])),
        ))
        .await
        .expect("update");

    let status = response.status();
    let updated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["identifier"], quiz_id);
    assert_eq!(updated["owner"], "alice@example.com");
    assert_eq!(updated["title"], "WW2 revised");
    assert_ne!(updated["questions"][0]["identifier"], old_question_id);
}

#[tokio::test]
async fn missing_quiz_is_404() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/quizzes/42", Some(&token), None))
        .await
        .expect("get");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Quiz does not exist");
}

#[tokio::test]
async fn list_filters_by_owner_title_and_categories() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let history = test_support::insert_category(&ctx.state, "History").await.identifier.unwrap();
    let science = test_support::insert_category(&ctx.state, "Science").await.identifier.unwrap();

    test_support::insert_quiz(&ctx.state, "alice@example.com", "WW2 Quiz", vec![history]).await;
    test_support::insert_quiz(&ctx.state, "alice@example.com", "Physics Quiz", vec![science]).await;
    test_support::insert_quiz(&ctx.state, "bob@example.com", "Cold War Quiz", vec![history]).await;

    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let cases = [
        ("/api/v1/quizzes?owner=alice%40example.com", vec!["WW2 Quiz", "Physics Quiz"]),
        ("/api/v1/quizzes?title=quiz", vec!["WW2 Quiz", "Physics Quiz", "Cold War Quiz"]),
        (
            "/api/v1/quizzes?owner=alice%40example.com&title=physics",
            vec!["Physics Quiz"],
        ),
    ];

    for (uri, expected) in cases {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, uri, Some(&token), None))
            .await
            .expect("list");
        let listed = test_support::read_json(response).await;
        let titles: Vec<&str> =
            listed.as_array().unwrap().iter().map(|q| q["title"].as_str().unwrap()).collect();
        assert_eq!(titles, expected, "uri: {uri}");
    }

    let uri = format!("/api/v1/quizzes?categories={history}");
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("list");
    let listed = test_support::read_json(response).await;
    let titles: Vec<&str> =
        listed.as_array().unwrap().iter().map(|q| q["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["WW2 Quiz", "Cold War Quiz"]);

    let uri = format!("/api/v1/quizzes?categories={history},{science}");
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&token), None))
        .await
        .expect("list");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 3);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/quizzes?categories=not-a-number",
            Some(&token),
            None,
        ))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reads_and_grading_are_public_but_mutations_require_auth() {
    let ctx = test_support::setup_test_context().await;
    let quiz = test_support::insert_quiz(&ctx.state, "alice@example.com", "WW2", vec![]).await;
    let uri = format!("/api/v1/quizzes/{}", quiz.identifier.unwrap());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/quizzes", None, None))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, None, None))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);

    // Grading takes no identity either; insert_quiz marks the first answer
    // correct and the second not.
    let submission = json!({
        "identifier": quiz.identifier.unwrap(),
        "questions": [{
            "identifier": quiz.questions[0].identifier.unwrap(),
            "answers": [
                {"identifier": quiz.questions[0].answers[0].identifier.unwrap(), "is_correct": true},
                {"identifier": quiz.questions[0].answers[1].identifier.unwrap(), "is_correct": false}
            ]
        }]
    });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/validate",
            None,
            Some(submission),
        ))
        .await
        .expect("validate");
    let status = response.status();
    let result = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {result}");
    assert_eq!(result["points"], 1);

    for (method, target, body) in [
        (Method::POST, "/api/v1/quizzes".to_string(), Some(quiz_payload("New quiz", &[]))),
        (Method::PUT, uri.clone(), Some(quiz_payload("Renamed", &[]))),
        (Method::DELETE, uri.clone(), None),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(method.clone(), &target, None, body))
            .await
            .expect("mutation");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {target}");
    }
}

#[tokio::test]
async fn empty_categories_filter_is_ignored() {
    let ctx = test_support::setup_test_context().await;
    let history = test_support::insert_category(&ctx.state, "History").await.identifier.unwrap();
    test_support::insert_quiz(&ctx.state, "alice@example.com", "WW2 Quiz", vec![history]).await;
    test_support::insert_quiz(&ctx.state, "alice@example.com", "Untagged Quiz", vec![]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/quizzes?categories=",
            None,
            None,
        ))
        .await
        .expect("list");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn validate_scores_a_submission() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(&ctx.state, "alice@example.com", "Str0ng!pass").await;
    let category = test_support::insert_category(&ctx.state, "History").await;
    let token = test_support::bearer_token("alice@example.com", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes",
            Some(&token),
            Some(quiz_payload("WW2 Quiz", &[category.identifier.unwrap()])),
        ))
        .await
        .expect("create");
    let created = test_support::read_json(response).await;
    let quiz_id = created["identifier"].as_i64().unwrap();
    let question_id = created["questions"][0]["identifier"].as_i64().unwrap();
    let answer_ids: Vec<i64> = created["questions"][0]["answers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|answer| answer["identifier"].as_i64().unwrap())
        .collect();

    let submission = |marks: [bool; 4]| {
        json!({
            "identifier": quiz_id,
            "questions": [{
                "identifier": question_id,
                "answers": answer_ids
                    .iter()
                    .zip(marks)
                    .map(|(id, mark)| json!({"identifier": id, "is_correct": mark}))
                    .collect::<Vec<_>>()
            }]
        })
    };

    // Answers 1-3 are correct, 4 is not.
    let cases = [
        ([true, true, true, false], 3),
        ([true, false, false, false], 1),
        ([true, true, true, true], 0),
        ([false, false, false, false], 0),
    ];
    for (marks, expected_points) in cases {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/quizzes/validate",
                Some(&token),
                Some(submission(marks)),
            ))
            .await
            .expect("validate");
        let status = response.status();
        let result = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {result}");
        assert_eq!(result["total_points"], 3, "marks: {marks:?}");
        assert_eq!(result["points"], expected_points, "marks: {marks:?}");
    }

    // Leaving out an answer is a structural mismatch, not a zero score.
    let incomplete = json!({
        "identifier": quiz_id,
        "questions": [{
            "identifier": question_id,
            "answers": answer_ids[..3]
                .iter()
                .map(|id| json!({"identifier": id, "is_correct": true}))
                .collect::<Vec<_>>()
        }]
    });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/validate",
            Some(&token),
            Some(incomplete),
        ))
        .await
        .expect("validate");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/validate",
            Some(&token),
            Some(json!({"identifier": 999, "questions": []})),
        ))
        .await
        .expect("validate");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
