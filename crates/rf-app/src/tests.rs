//! End-to-end client flows against the in-memory backend.

use std::time::Duration;

use rf_core::permissions::MUST_LOG_IN;
use rf_core::testing::{FakeForum, MockTokenStore};
use rf_core::{
    ApiError, EditTarget, Form, ForumApi, Navigation, NotificationKind, Page, Screen, Snapshot,
    UiAction, User,
};

use crate::coordinator::SELECT_THREAD_FIRST;
use crate::{Forum, SESSION_EXPIRED};

fn quiet_store() -> Box<MockTokenStore> {
    let mut store = MockTokenStore::new();
    store.expect_load().returning(|| Ok(None));
    store.expect_save().returning(|_| Ok(()));
    store.expect_clear().returning(|| Ok(()));
    Box::new(store)
}

fn credentials(username: &str, password: &str) -> Form {
    Form::new().with("username", username).with("password", password)
}

struct World {
    backend: FakeForum,
    alice: User,
    bob: User,
    root: User,
    thread_id: i64,
    alice_reply: i64,
    bob_reply: i64,
}

/// alice owns a thread with one reply from each of alice and bob; root is
/// an admin.
fn world() -> World {
    let backend = FakeForum::new();
    let alice = backend.add_user("alice", "pw", false);
    let bob = backend.add_user("bob", "pw", false);
    let root = backend.add_user("root", "pw", true);
    let thread = backend.add_thread(alice.id, "Hello", "first post");
    let alice_reply = backend.add_reply(alice.id, thread.id, "mine").id;
    let bob_reply = backend.add_reply(bob.id, thread.id, "theirs").id;
    World { backend, alice, bob, root, thread_id: thread.id, alice_reply, bob_reply }
}

impl World {
    fn client(&self) -> Forum {
        Forum::new(Box::new(self.backend.clone()), quiet_store(), Duration::from_secs(4))
    }

    /// A client signed in as `username`, looking at the seeded thread.
    async fn on_thread_as(&self, username: &str) -> Forum {
        let mut forum = self.client();
        forum.dispatch(UiAction::SubmitLogin, &credentials(username, "pw")).await.unwrap();
        forum.navigate(Navigation::Thread(self.thread_id)).await.unwrap();
        self.backend.clear_requests();
        forum
    }
}

fn mutations(forum: &Forum) -> Vec<String> {
    forum
        .render()
        .unwrap()
        .bindings
        .into_iter()
        .filter(|b| !matches!(b.action, UiAction::Navigate(_)))
        .map(|b| b.control)
        .collect()
}

fn error_message(forum: &Forum) -> String {
    let note = forum.notification().expect("a notification");
    assert_eq!(note.kind, NotificationKind::Error);
    note.message.clone()
}

#[tokio::test]
async fn failed_login_keeps_the_signed_in_user() {
    let w = world();
    let mut forum = w.client();
    forum.dispatch(UiAction::SubmitLogin, &credentials("alice", "pw")).await.unwrap();
    let token = forum.session().bearer().map(str::to_owned);

    let err = forum.dispatch(UiAction::SubmitLogin, &credentials("bob", "nope")).await.unwrap_err();

    assert!(err.is_auth_rejected());
    assert_eq!(forum.current_user(), Some(&w.alice));
    assert_eq!(forum.session().bearer().map(str::to_owned), token);
    assert_eq!(error_message(&forum), "Incorrect username or password");
}

#[tokio::test]
async fn empty_credentials_never_reach_the_backend() {
    let w = world();
    let mut forum = w.client();

    assert!(forum.dispatch(UiAction::SubmitLogin, &credentials("  ", "pw")).await.is_err());

    assert!(w.backend.requests().is_empty());
    assert_eq!(error_message(&forum), "Username and password are required.");
}

#[tokio::test]
async fn logout_twice_ends_signed_out_both_times() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;

    forum.dispatch(UiAction::Logout, &Form::new()).await.unwrap();
    assert!(forum.session().bearer().is_none() && forum.current_user().is_none());
    assert_eq!(forum.view().screen, Screen::Home);
    assert_eq!(forum.notification().unwrap().message, "Logged out.");

    forum.dispatch(UiAction::Logout, &Form::new()).await.unwrap();
    assert!(forum.session().bearer().is_none() && forum.current_user().is_none());
}

#[tokio::test]
async fn anonymous_user_cannot_mutate_even_when_forced() {
    let w = world();
    let mut forum = w.client();
    forum.navigate(Navigation::Thread(w.thread_id)).await.unwrap();
    w.backend.clear_requests();

    assert!(mutations(&forum).is_empty());
    for action in [
        UiAction::DeleteThread(w.thread_id),
        UiAction::DeleteReply(w.bob_reply),
        UiAction::BeginEdit(EditTarget::thread(w.thread_id)),
        UiAction::SubmitReply { thread_id: w.thread_id },
    ] {
        assert!(forum.dispatch(action, &Form::new().with("text", "x")).await.is_err());
        assert_eq!(error_message(&forum), MUST_LOG_IN);
    }
    assert!(w.backend.requests().is_empty());
}

#[tokio::test]
async fn non_admin_delete_is_refused_locally() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;

    assert!(!mutations(&forum).contains(&format!("delete-thread-{}", w.thread_id)));
    assert!(forum.dispatch(UiAction::DeleteThread(w.thread_id), &Form::new()).await.is_err());

    assert_eq!(error_message(&forum), "Only admins can delete posts.");
    assert!(w.backend.requests().is_empty());
    assert!(w.backend.thread(w.thread_id).is_some());
}

#[tokio::test]
async fn backend_permission_denial_is_surfaced_verbatim() {
    let w = world();
    let mut forum = w.on_thread_as("root").await;
    // Another admin demotes root behind this client's back.
    let other = w.backend.add_user("other", "pw", true);
    let token = w.backend.token_for(other.id);
    w.backend.remove_admin(&token, w.root.id).await.unwrap();
    let before = forum.render().unwrap();

    let err = forum.dispatch(UiAction::DeleteThread(w.thread_id), &Form::new()).await.unwrap_err();

    assert!(matches!(err, rf_core::AppError::Api(ApiError::PermissionDenied(_))));
    assert_eq!(error_message(&forum), "Admin privileges required");
    assert_eq!(forum.view().screen, Screen::ThreadDetail);
    assert_eq!(forum.render().unwrap().bindings, before.bindings);
    assert!(forum.current_user().is_some());
}

#[tokio::test]
async fn admin_deletes_thread_and_lands_on_the_list() {
    let w = world();
    let mut forum = w.on_thread_as("root").await;

    forum.dispatch(UiAction::DeleteThread(w.thread_id), &Form::new()).await.unwrap();

    assert!(w.backend.thread(w.thread_id).is_none());
    assert_eq!(forum.view().screen, Screen::Home);
    assert!(matches!(forum.page(), Page::Threads(threads) if threads.is_empty()));
    assert_eq!(forum.notification().unwrap().message, "Thread deleted.");
}

#[tokio::test]
async fn admin_deletes_reply_and_stays_on_the_thread() {
    let w = world();
    let mut forum = w.on_thread_as("root").await;

    forum.dispatch(UiAction::DeleteReply(w.bob_reply), &Form::new()).await.unwrap();

    assert_eq!(forum.view().current(), Navigation::Thread(w.thread_id));
    assert!(!mutations(&forum).contains(&format!("delete-reply-{}", w.bob_reply)));
    assert_eq!(w.backend.replies_of(w.thread_id).len(), 1);
}

#[tokio::test]
async fn cancel_restores_snapshot_without_a_request() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;
    let target = EditTarget::reply(w.alice_reply);

    forum.dispatch(UiAction::BeginEdit(target), &Form::new()).await.unwrap();
    forum.update_draft(target, Snapshot::Reply { text: "half typed".into() });
    assert!(forum.render().unwrap().markup.contains("half typed"));

    forum.dispatch(UiAction::CancelEdit(target), &Form::new()).await.unwrap();

    let rendered = forum.render().unwrap();
    assert!(!rendered.markup.contains("half typed"));
    assert!(rendered.markup.contains("mine"));
    assert!(rendered.has_control(&format!("edit-reply-{}", w.alice_reply)));
    assert!(w.backend.requests().is_empty());
}

#[tokio::test]
async fn failed_edit_keeps_form_and_draft() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;
    let target = EditTarget::thread(w.thread_id);
    forum.dispatch(UiAction::BeginEdit(target), &Form::new()).await.unwrap();

    w.backend.fail_next(ApiError::Network("connection reset".into()));
    let form = Form::new().with("title", "Hello again").with("text", "rewritten");
    assert!(forum.dispatch(UiAction::SubmitEdit(target), &form).await.is_err());

    let draft = forum.view().editing.get(target).expect("form still open");
    let typed = Snapshot::Thread { title: "Hello again".into(), text: "rewritten".into() };
    let shown = Snapshot::Thread { title: "Hello".into(), text: "first post".into() };
    assert_eq!(draft.current, typed);
    assert_eq!(draft.original, shown);
    assert_eq!(error_message(&forum), rf_core::NETWORK_FAILURE_MESSAGE);
    assert!(forum.render().unwrap().has_control(&format!("save-thread-{}", w.thread_id)));
}

#[tokio::test]
async fn invalid_edit_is_rejected_before_dispatch() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;
    let target = EditTarget::reply(w.alice_reply);
    forum.dispatch(UiAction::BeginEdit(target), &Form::new()).await.unwrap();

    let too_long = "x".repeat(rf_core::validation::MAX_TEXT_LEN + 1);
    let form = Form::new().with("text", too_long);
    assert!(forum.dispatch(UiAction::SubmitEdit(target), &form).await.is_err());

    assert_eq!(error_message(&forum), "Reply text must be at most 2000 characters.");
    assert!(forum.view().editing.is_editing(target));
    assert!(w.backend.requests().is_empty());
}

#[tokio::test]
async fn successful_edit_closes_form_and_refreshes() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;
    let target = EditTarget::reply(w.alice_reply);
    forum.dispatch(UiAction::BeginEdit(target), &Form::new()).await.unwrap();

    let form = Form::new().with("text", "mine, revised");
    forum.dispatch(UiAction::SubmitEdit(target), &form).await.unwrap();

    assert!(!forum.view().editing.is_editing(target));
    let rendered = forum.render().unwrap();
    assert!(rendered.markup.contains("mine, revised"));
    assert!(rendered.markup.contains("(edited)"));
    assert_eq!(forum.notification().unwrap().message, "Reply updated.");
    assert_eq!(w.backend.requests()[0], format!("PUT /replies/{}/edit", w.alice_reply));
}

#[tokio::test]
async fn owner_edits_thread_and_sees_it_marked_edited() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;
    let target = EditTarget::thread(w.thread_id);
    forum.dispatch(UiAction::BeginEdit(target), &Form::new()).await.unwrap();

    let form = Form::new().with("title", "A").with("text", "b");
    forum.dispatch(UiAction::SubmitEdit(target), &form).await.unwrap();

    assert!(!forum.view().editing.is_editing(target));
    let Page::Thread(page) = forum.page() else { panic!("expected thread page") };
    assert_eq!(page.thread.title, "A");
    assert_eq!(page.thread.text, "b");
    assert!(page.thread.edited);
    assert_eq!(forum.notification().unwrap().message, "Thread updated.");
    let requests = w.backend.requests();
    assert_eq!(
        requests[..2],
        [format!("PUT /threads/{}/edit", w.thread_id), format!("GET /threads/{}", w.thread_id)]
    );
}

#[tokio::test]
async fn edits_are_independent_per_resource() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;
    let thread = EditTarget::thread(w.thread_id);
    let reply = EditTarget::reply(w.alice_reply);
    forum.dispatch(UiAction::BeginEdit(thread), &Form::new()).await.unwrap();
    forum.dispatch(UiAction::BeginEdit(reply), &Form::new()).await.unwrap();
    forum.update_draft(reply, Snapshot::Reply { text: "draft".into() });

    forum.dispatch(UiAction::CancelEdit(thread), &Form::new()).await.unwrap();

    assert!(!forum.view().editing.is_editing(thread));
    let open = forum.view().editing.get(reply).unwrap();
    assert_eq!(open.current, Snapshot::Reply { text: "draft".into() });
}

#[tokio::test]
async fn cannot_edit_someone_elses_reply() {
    let w = world();
    let mut forum = w.on_thread_as("alice").await;

    let err = forum.begin_edit(EditTarget::reply(w.bob_reply)).unwrap_err();

    assert_eq!(err.user_message(), "You can only edit your own posts.");
    assert!(forum.view().editing.is_empty());
}

#[tokio::test]
async fn new_thread_routes_to_its_detail() {
    let w = world();
    let mut forum = w.client();
    forum.dispatch(UiAction::SubmitLogin, &credentials("bob", "pw")).await.unwrap();
    forum.navigate(Navigation::CreateThread).await.unwrap();

    let form = Form::new().with("title", "  Second  ").with("text", "body");
    forum.dispatch(UiAction::SubmitThread, &form).await.unwrap();

    assert_eq!(forum.view().screen, Screen::ThreadDetail);
    let Page::Thread(page) = forum.page() else { panic!("expected thread page") };
    assert_eq!(page.thread.title, "Second");
    assert_eq!(page.thread.user_id, w.bob.id);
    assert_eq!(forum.notification().unwrap().message, "Thread created.");
}

#[tokio::test]
async fn empty_title_is_rejected_locally() {
    let w = world();
    let mut forum = w.client();
    forum.dispatch(UiAction::SubmitLogin, &credentials("bob", "pw")).await.unwrap();
    forum.navigate(Navigation::CreateThread).await.unwrap();
    w.backend.clear_requests();

    let form = Form::new().with("title", "").with("text", "body");
    assert!(forum.dispatch(UiAction::SubmitThread, &form).await.is_err());

    assert_eq!(error_message(&forum), "Title cannot be empty.");
    assert_eq!(forum.view().screen, Screen::CreateThread);
    assert!(w.backend.requests().is_empty());
}

#[tokio::test]
async fn reply_needs_the_thread_on_screen() {
    let w = world();
    let mut forum = w.client();
    forum.dispatch(UiAction::SubmitLogin, &credentials("bob", "pw")).await.unwrap();
    w.backend.clear_requests();

    let form = Form::new().with("text", "hi");
    assert!(forum.dispatch(UiAction::SubmitReply { thread_id: w.thread_id }, &form).await.is_err());

    assert_eq!(error_message(&forum), SELECT_THREAD_FIRST);
    assert!(w.backend.requests().is_empty());
}

#[tokio::test]
async fn reply_is_posted_and_shown() {
    let w = world();
    let mut forum = w.on_thread_as("bob").await;

    let form = Form::new().with("text", "another one");
    forum.dispatch(UiAction::SubmitReply { thread_id: w.thread_id }, &form).await.unwrap();

    assert_eq!(w.backend.replies_of(w.thread_id).len(), 3);
    assert!(forum.render().unwrap().markup.contains("another one"));
    assert_eq!(forum.notification().unwrap().message, "Reply posted.");
}

#[tokio::test]
async fn revoked_token_signs_out_on_next_mutation() {
    let w = world();
    let mut forum = w.on_thread_as("bob").await;
    w.backend.revoke_tokens();

    let form = Form::new().with("text", "hello?");
    let reply = UiAction::SubmitReply { thread_id: w.thread_id };
    let err = forum.dispatch(reply, &form).await.unwrap_err();

    assert!(err.is_auth_rejected());
    assert!(forum.session().bearer().is_none());
    assert_eq!(forum.view().screen, Screen::Home);
    assert_eq!(error_message(&forum), SESSION_EXPIRED);
    assert!(forum.render().unwrap().has_control("nav-login"));
}

#[tokio::test]
async fn registration_leads_to_login() {
    let w = world();
    let mut forum = w.client();
    forum.navigate(Navigation::Register).await.unwrap();

    forum.dispatch(UiAction::SubmitRegister, &credentials("carol", "secret")).await.unwrap();
    assert_eq!(forum.view().screen, Screen::Login);
    assert_eq!(forum.notification().unwrap().kind, NotificationKind::Info);

    forum.dispatch(UiAction::SubmitLogin, &credentials("carol", "secret")).await.unwrap();
    assert_eq!(forum.current_user().map(|u| u.username.as_str()), Some("carol"));
}

#[tokio::test]
async fn duplicate_registration_shows_backend_detail() {
    let w = world();
    let mut forum = w.client();
    forum.navigate(Navigation::Register).await.unwrap();

    assert!(forum.dispatch(UiAction::SubmitRegister, &credentials("alice", "x")).await.is_err());

    assert_eq!(error_message(&forum), "Username already registered");
    assert_eq!(forum.view().screen, Screen::Register);
}

#[tokio::test]
async fn admin_promotes_and_demotes_users() {
    let w = world();
    let mut forum = w.client();
    forum.dispatch(UiAction::SubmitLogin, &credentials("root", "pw")).await.unwrap();
    forum.navigate(Navigation::Users).await.unwrap();

    forum.dispatch(UiAction::MakeAdmin(w.alice.id), &Form::new()).await.unwrap();
    assert!(w.backend.user(w.alice.id).unwrap().is_admin);
    assert_eq!(forum.notification().unwrap().message, "alice is now an admin.");
    assert!(!mutations(&forum).contains(&format!("make-admin-{}", w.alice.id)));

    forum.dispatch(UiAction::RemoveAdmin(w.alice.id), &Form::new()).await.unwrap();
    assert!(!w.backend.user(w.alice.id).unwrap().is_admin);
    assert_eq!(forum.view().screen, Screen::Users);
}

#[tokio::test]
async fn admin_cannot_demote_themselves() {
    let w = world();
    let mut forum = w.client();
    forum.dispatch(UiAction::SubmitLogin, &credentials("root", "pw")).await.unwrap();
    forum.navigate(Navigation::Users).await.unwrap();
    w.backend.clear_requests();

    assert!(forum.dispatch(UiAction::RemoveAdmin(w.root.id), &Form::new()).await.is_err());

    assert_eq!(error_message(&forum), "You cannot remove your own admin rights.");
    assert!(w.backend.requests().is_empty());
}
