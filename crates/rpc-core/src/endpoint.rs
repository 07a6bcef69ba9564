use std::{collections::BTreeMap, fmt};

use thiserror::Error;

use crate::codec::{DecodeBody, EncodeBody};

/// HTTP verbs an endpoint may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an endpoint is sent with `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// Never carries an authorization header.
    Public,
    /// Requires the dispatcher's access token.
    AccessToken,
}

/// Errors raised while building or resolving an endpoint descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The URL template text is not well formed.
    #[error("invalid url template '{template}': {reason}")]
    InvalidTemplate {
        template: String,
        reason: &'static str,
    },
    /// A template parameter has no value.
    #[error("missing value for path parameter '{name}'")]
    MissingParameter { name: String },
    /// A value was supplied for a name the template does not declare.
    #[error("path parameter '{name}' is not declared by the template")]
    UnknownParameter { name: String },
    /// A value cannot be placed in a single path segment.
    #[error("path parameter '{name}' is malformed: {reason}")]
    MalformedParameter { name: String, reason: &'static str },
}

/// One piece of a URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// Ordered literal/parameter segments parsed from text like `/a/{x}/b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parse a template. A leading `/` is optional.
    pub fn parse(template: &str) -> Result<Self, DescriptorError> {
        let invalid = |reason| DescriptorError::InvalidTemplate {
            template: template.to_owned(),
            reason,
        };

        let trimmed = template.trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let mut segments = Vec::new();
        for part in trimmed.split('/') {
            if part.is_empty() {
                return Err(invalid("empty path segment"));
            }

            if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("parameter names must be non-empty and unnested"));
                }
                let duplicate = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                if duplicate {
                    return Err(invalid("parameter declared twice"));
                }
                segments.push(Segment::Param(name.to_owned()));
            } else if part.contains(['{', '}']) {
                return Err(invalid("parameters must span a whole segment"));
            } else {
                segments.push(Segment::Literal(part.to_owned()));
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in declared order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// Fully resolved request-shaping data for one call.
///
/// Only constructed through [`DescriptorBuilder::build`], which guarantees
/// that every template parameter has a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    method: Method,
    template: UrlTemplate,
    path_params: BTreeMap<String, String>,
    query_params: Vec<(String, Option<String>)>,
}

impl EndpointDescriptor {
    pub fn builder(method: Method, template: UrlTemplate) -> DescriptorBuilder {
        DescriptorBuilder {
            method,
            template,
            path_params: BTreeMap::new(),
            query_params: Vec::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    pub fn query_params(&self) -> &[(String, Option<String>)] {
        &self.query_params
    }

    /// Join `base` with the substituted path and the present query parameters.
    ///
    /// Each substituted segment and every query name/value is percent-encoded.
    pub fn resolve_url(&self, base: &str) -> Result<String, DescriptorError> {
        let mut url = base.trim_end_matches('/').to_owned();

        for segment in &self.template.segments {
            url.push('/');
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Param(name) => {
                    let value = self.path_params.get(name).ok_or_else(|| {
                        DescriptorError::MissingParameter { name: name.clone() }
                    })?;
                    validate_segment(name, value)?;
                    url.push_str(&urlencoding::encode(value));
                }
            }
        }

        let mut separator = '?';
        for (name, value) in &self.query_params {
            let Some(value) = value else {
                continue;
            };
            url.push(separator);
            url.push_str(&urlencoding::encode(name));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
            separator = '&';
        }

        Ok(url)
    }
}

fn validate_segment(name: &str, value: &str) -> Result<(), DescriptorError> {
    let reason = match value {
        "" => "value is empty",
        "." | ".." => "dot segments are collapsed by url normalization",
        _ => return Ok(()),
    };
    Err(DescriptorError::MalformedParameter {
        name: name.to_owned(),
        reason,
    })
}

/// Collects parameters before validating them against the template.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    method: Method,
    template: UrlTemplate,
    path_params: BTreeMap<String, String>,
    query_params: Vec<(String, Option<String>)>,
}

impl DescriptorBuilder {
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter; `None` values are omitted from the URL.
    pub fn query_param(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.query_params.push((name.into(), value));
        self
    }

    pub fn build(self) -> Result<EndpointDescriptor, DescriptorError> {
        if let Some(missing) = self
            .template
            .params()
            .find(|name| !self.path_params.contains_key(*name))
        {
            return Err(DescriptorError::MissingParameter {
                name: missing.to_owned(),
            });
        }

        if let Some(unknown) = self
            .path_params
            .keys()
            .find(|name| !self.template.params().any(|declared| declared == name.as_str()))
        {
            return Err(DescriptorError::UnknownParameter {
                name: unknown.clone(),
            });
        }

        for (name, value) in &self.path_params {
            validate_segment(name, value)?;
        }

        Ok(EndpointDescriptor {
            method: self.method,
            template: self.template,
            path_params: self.path_params,
            query_params: self.query_params,
        })
    }
}

/// A typed protocol operation: verb, URL template, auth requirement, and the
/// request/response bodies together with their wire formats.
///
/// Endpoints without a request body use `type Request = ()` with
/// [`crate::codec::NoBody`].
pub trait Endpoint: Send + Sync {
    /// Short name used in logs and errors.
    const NAME: &'static str;
    const METHOD: Method;
    /// URL template relative to the homeserver base URL.
    const PATH: &'static str;
    const AUTH: AuthRequirement;

    type Request: Send + Sync;
    type RequestFormat: EncodeBody<Self::Request>;
    type Response: Send;
    type ResponseFormat: DecodeBody<Self::Response>;

    fn body(&self) -> &Self::Request;

    fn path_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn query_params(&self) -> Vec<(&'static str, Option<String>)> {
        Vec::new()
    }

    /// Build the descriptor for this call.
    fn descriptor(&self) -> Result<EndpointDescriptor, DescriptorError> {
        let template = UrlTemplate::parse(Self::PATH)?;
        let mut builder = EndpointDescriptor::builder(Self::METHOD, template);
        for (name, value) in self.path_params() {
            builder = builder.path_param(name, value);
        }
        for (name, value) in self.query_params() {
            builder = builder.query_param(name, value);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(text: &str) -> UrlTemplate {
        UrlTemplate::parse(text).expect("template should parse")
    }

    #[test]
    fn substitutes_path_parameters_in_order() {
        let descriptor = EndpointDescriptor::builder(Method::Get, template("/a/{x}/b"))
            .path_param("x", "42")
            .build()
            .expect("descriptor should build");

        assert_eq!(descriptor.resolve_url("").expect("resolves"), "/a/42/b");
        assert_eq!(
            descriptor
                .resolve_url("https://matrix.example.org/")
                .expect("resolves"),
            "https://matrix.example.org/a/42/b"
        );
    }

    #[test]
    fn rejects_unresolved_parameter_at_build_time() {
        let err = EndpointDescriptor::builder(Method::Get, template("/a/{x}/b"))
            .build()
            .expect_err("missing parameter must fail");
        assert_eq!(
            err,
            DescriptorError::MissingParameter { name: "x".into() }
        );
    }

    #[test]
    fn rejects_parameters_not_in_template() {
        let err = EndpointDescriptor::builder(Method::Get, template("/a"))
            .path_param("y", "1")
            .build()
            .expect_err("unknown parameter must fail");
        assert_eq!(err, DescriptorError::UnknownParameter { name: "y".into() });
    }

    #[test]
    fn percent_encodes_matrix_identifiers() {
        let descriptor = EndpointDescriptor::builder(
            Method::Get,
            template("/_matrix/client/r0/profile/{userId}/displayname"),
        )
        .path_param("userId", "@alice:example.org")
        .build()
        .expect("descriptor should build");

        assert_eq!(
            descriptor
                .resolve_url("https://hs.example")
                .expect("resolves"),
            "https://hs.example/_matrix/client/r0/profile/%40alice%3Aexample.org/displayname"
        );
    }

    #[test]
    fn encodes_slashes_inside_a_segment() {
        let descriptor = EndpointDescriptor::builder(Method::Put, template("/x/{txn}"))
            .path_param("txn", "a/b")
            .build()
            .expect("descriptor should build");
        assert_eq!(descriptor.resolve_url("").expect("resolves"), "/x/a%2Fb");
    }

    #[test]
    fn omits_absent_query_values() {
        let descriptor = EndpointDescriptor::builder(Method::Post, template("register"))
            .query_param("kind", None)
            .query_param("note", Some("a b&c".into()))
            .query_param("flag", Some("1".into()))
            .build()
            .expect("descriptor should build");

        assert_eq!(
            descriptor.resolve_url("https://hs").expect("resolves"),
            "https://hs/register?note=a%20b%26c&flag=1"
        );
    }

    #[test]
    fn rejects_dot_segments_and_empty_values() {
        for value in ["", ".", ".."] {
            let err = EndpointDescriptor::builder(Method::Get, template("/a/{x}"))
                .path_param("x", value)
                .build()
                .expect_err("malformed value must fail");
            assert!(matches!(err, DescriptorError::MalformedParameter { .. }));
        }
    }

    #[test]
    fn rejects_malformed_templates() {
        for text in ["/a//b", "/a/{}", "/a/x{y}", "/a/{x}/{x}"] {
            let err = UrlTemplate::parse(text).expect_err("template must be rejected");
            assert!(matches!(err, DescriptorError::InvalidTemplate { .. }));
        }
    }

    #[test]
    fn lists_params_in_declared_order() {
        let parsed = template("/sendToDevice/{eventType}/{txnId}");
        assert_eq!(parsed.params().collect::<Vec<_>>(), ["eventType", "txnId"]);
        assert_eq!(
            parsed.segments()[0],
            Segment::Literal("sendToDevice".into())
        );
    }
}
