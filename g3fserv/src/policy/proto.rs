/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub const POLICY_REQUEST: &[u8] = b"<policy-file-request/>";

/// The cross-domain policy file, NUL terminated.
/// NOTE: legacy plugin clients parse this format strictly, the byte sequence
/// must be reproduced exactly as is.
pub const POLICY_FILE: &[u8] = b"<?xml version=\"1.0\"?>\
<!DOCTYPE cross-domain-policy \
SYSTEM \"http://www.adobe.com/xml/dtds/cross-domain-policy.dtd\">\
<cross-domain-policy>\
<allow-access-from domain=\"*\" to-ports=\"*\"/>\
</cross-domain-policy>\0";

/// Check a received buffer against the policy request marker.
///
/// Trailing NUL padding is allowed, anything else has to match exactly.
pub fn is_policy_request(buf: &[u8]) -> bool {
    let mut end = buf.len();
    while end > 0 && buf[end - 1] == 0 {
        end -= 1;
    }
    &buf[..end] == POLICY_REQUEST
}
