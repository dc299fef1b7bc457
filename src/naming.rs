/**
 * Name Templates
 *
 * Group and channel layer names are built from templates holding
 * `{placeholder}` tokens:
 *
 * - `{mode}`: base group name of the output mode
 * - `{source:name}`: name of the source layer
 * - `{color:short}`: channel label (`C`, `M`, `Y`, `K`, `KT`, `Mono`)
 * - `{color:long}`: ink name (`Cyan`, ...), empty for other channels
 *
 * Tokens are matched exactly and substituted in a single pass, so text
 * coming from a substitution is never expanded again. Anything else is
 * copied literally.
 */

use crate::recipe::Channel;

/// Default template of the output group name
pub const DEFAULT_GROUP_TEMPLATE: &str = "{mode}-{source:name}";

/// Default template of channel layer names
pub const DEFAULT_LAYER_TEMPLATE: &str = "{mode}[{color:short}]-{source:name}";

/// Values substituted into a template
#[derive(Debug, Clone, Copy)]
pub struct NameContext<'a> {
    /// Base group name of the output mode
    pub mode: &'a str,
    /// Source layer name
    pub source: &'a str,
    /// Channel, `None` when naming the group
    pub channel: Option<Channel>,
}

impl<'a> NameContext<'a> {
    fn lookup(&self, token: &str) -> Option<&'a str> {
        match token {
            "mode" => Some(self.mode),
            "source:name" => Some(self.source),
            "color:short" => Some(self.channel.map_or("", Channel::short)),
            "color:long" => Some(self.channel.map_or("", Channel::long)),
            _ => None,
        }
    }
}

/// Expand every known token of `template`
pub fn expand(template: &str, context: &NameContext<'_>) -> String {
    let mut name = String::with_capacity(template.len() + context.mode.len() + context.source.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        name.push_str(&rest[..open]);
        let candidate = &rest[open..];

        let substitution = candidate
            .find('}')
            .and_then(|close| context.lookup(&candidate[1..close]).map(|value| (value, close)));

        match substitution {
            Some((value, close)) => {
                name.push_str(value);
                rest = &candidate[close + 1..];
            }
            None => {
                name.push('{');
                rest = &candidate[1..];
            }
        }
    }

    name.push_str(rest);
    name
}

/// Name of the output group
pub fn group_name(template: &str, mode: &str, source: &str) -> String {
    expand(
        template,
        &NameContext {
            mode,
            source,
            channel: None,
        },
    )
}

/// Name of a channel layer
pub fn channel_name(template: &str, mode: &str, source: &str, channel: Channel) -> String {
    expand(
        template,
        &NameContext {
            mode,
            source,
            channel: Some(channel),
        },
    )
}
