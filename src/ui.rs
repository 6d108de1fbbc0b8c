use anyhow::Result;
use iocraft::prelude::*;
use log::{debug, error};

use crate::rest_types::ApiResponse;

/// Outcome of one settled request, as shown in the notification area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Collapse a settled request into its notice. A response with
/// `success: false` and a failed request both map to the same generic
/// error text; only the failed request is logged.
pub fn settle(outcome: Result<ApiResponse>, success_text: &str, error_text: &str) -> Notice {
    match outcome {
        Ok(response) if response.success => Notice::Success(success_text.to_string()),
        Ok(response) => {
            debug!(
                "API reported failure: message={:?} data={:?}",
                response.message, response.data
            );
            Notice::Error(error_text.to_string())
        }
        Err(err) => {
            error!("Error: {:#}", err);
            Notice::Error(error_text.to_string())
        }
    }
}

pub fn notify(notice: &Notice) {
    match notice {
        Notice::Success(text) => element!(SuccessMessage(message: text.clone())).print(),
        Notice::Error(text) => element!(ErrorMessage(message: text.clone())).print(),
    }
}

#[derive(Default, Props)]
pub struct SuccessMessageProps {
    pub message: String,
}

#[component]
pub fn SuccessMessage(props: &SuccessMessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(color: Color::Green, content: "✔ ")
            Text(content: props.message.clone())
        }
    }
}

#[derive(Default, Props)]
pub struct ErrorMessageProps {
    pub message: String,
}

#[component]
pub fn ErrorMessage(props: &ErrorMessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(color: Color::Red, content: "✖ ")
            Text(content: props.message.clone())
        }
    }
}

#[component]
pub fn ConfigHeader() -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            View(background_color: Color::Blue) {
                Text(content: " wadash configuration ", color: Color::White)
            }
        }
    }
}

#[derive(Default, Props)]
pub struct InputPromptProps {
    pub prompt: String,
    pub default: Option<String>,
    pub description: Option<String>,
}

#[component]
pub fn InputPrompt(props: &InputPromptProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            #(props.description.as_ref().map(|description| element! {
                Text(content: description.clone(), color: Color::DarkGrey)
            }))
            View(flex_direction: FlexDirection::Row) {
                Text(weight: Weight::Bold, content: props.prompt.clone())
                #(props.default.as_ref().map(|default| element! {
                    Text(content: format!(" [{}]", default), color: Color::DarkGrey)
                }))
            }
        }
    }
}
