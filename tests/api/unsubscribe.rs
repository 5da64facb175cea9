use crate::helpers::{FormParam, error_response, spawn_dispatcher, unsubscribe_response};
use wiremock::Mock;
use wiremock::matchers::any;

#[tokio::test]
async fn unsubscribe_without_a_concrete_subscription_is_a_no_op() {
    // Arrange
    let app = spawn_dispatcher().await;

    Mock::given(any())
        .respond_with(unsubscribe_response())
        .expect(0)
        .mount(&app.provider_server)
        .await;

    // Act
    app.dispatcher.unsubscribe(None).await;
    app.dispatcher.unsubscribe(Some("")).await;
    app.dispatcher.unsubscribe(Some("  ")).await;
    app.dispatcher.unsubscribe(Some("pending confirmation")).await;

    // Assert
    // Mock asserts on drop
}

#[tokio::test]
async fn unsubscribe_cancels_the_given_subscription() {
    // Arrange
    let app = spawn_dispatcher().await;

    Mock::given(FormParam("Action", "Unsubscribe"))
        .and(FormParam("SubscriptionArn", "arn:valid:id"))
        .respond_with(unsubscribe_response())
        .expect(1)
        .mount(&app.provider_server)
        .await;

    // Act
    app.dispatcher.unsubscribe(Some("arn:valid:id")).await;

    // Assert
    // Mock asserts on drop
}

#[tokio::test]
async fn unsubscribe_swallows_provider_errors() {
    // Arrange
    let app = spawn_dispatcher().await;

    Mock::given(any())
        .respond_with(error_response(404, "NotFound", "req-missing"))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    // Act
    app.dispatcher.unsubscribe(Some("arn:valid:id")).await;

    // Assert
    // Returning at all means the error never reached the caller.
}

#[tokio::test]
async fn unsubscribe_swallows_an_unreachable_provider() {
    // Arrange
    let app = spawn_dispatcher().await;
    app.settings
        .update(|settings| settings.endpoint = Some("http://127.0.0.1:9".to_string()));

    // Act
    app.dispatcher.unsubscribe(Some("arn:valid:id")).await;
}

#[tokio::test]
async fn unsubscribe_does_not_need_a_configured_topic() {
    // Arrange
    let app = spawn_dispatcher().await;
    app.settings.update(|settings| settings.topic_arn = String::new());

    Mock::given(FormParam("Action", "Unsubscribe"))
        .and(FormParam("SubscriptionArn", "arn:valid:id"))
        .respond_with(unsubscribe_response())
        .expect(1)
        .mount(&app.provider_server)
        .await;

    // Act
    app.dispatcher.unsubscribe(Some("arn:valid:id")).await;

    // Assert
    // Mock asserts on drop
}

#[tokio::test]
async fn unsubscribe_swallows_configuration_errors() {
    // Arrange
    let app = spawn_dispatcher().await;
    app.settings.make_unreadable();

    Mock::given(any())
        .respond_with(unsubscribe_response())
        .expect(0)
        .mount(&app.provider_server)
        .await;

    // Act
    app.dispatcher.unsubscribe(Some("arn:valid:id")).await;

    // Assert
    // Mock asserts on drop
}
