// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use log::debug;

use crate::model::{Node, NodeId};

use super::{ChainContext, ChainWalker, CheckError, Environment};

impl ChainWalker<'_> {
    /// Binds each builder-typed target of an assignment or declaration to
    /// the context of its value. Values are paired with targets by position;
    /// a call producing several results binds nothing.
    pub(crate) fn bind_all(
        &mut self,
        targets: &[NodeId],
        values: &[NodeId],
        mut env: Environment,
    ) -> Result<Environment, CheckError> {
        let program = self.program;
        for (target, value) in targets.iter().zip(values.iter()) {
            let multi_result = matches!(program.node(*value).node, Node::Call { .. })
                && program
                    .callee_signature(*value)
                    .is_some_and(|sig| sig.results.len() != 1);
            if multi_result {
                continue;
            }
            self.bind(*target, *value, &mut env)?;
        }
        Ok(env)
    }

    fn bind(
        &mut self,
        target: NodeId,
        value: NodeId,
        env: &mut Environment,
    ) -> Result<(), CheckError> {
        let program = self.program;
        let builder = self.roles.builder();
        let Some(obj) = program.ident_object(target) else {
            return Ok(());
        };
        if program.object(obj).ty != Some(builder) {
            return Ok(());
        }

        let data = program.node(value);
        let ctx = match &data.node {
            Node::Call { .. } if data.ty == Some(builder) => self.resolve_call(value, env)?,
            // Copying the context aliases the chain as it is now; later
            // changes to either variable stay separate.
            Node::Ident { .. } | Node::Selector { .. } => program
                .ident_object(value)
                .and_then(|source| env.lookup(source))
                .cloned()
                .unwrap_or_default(),
            _ => ChainContext::Untracked,
        };

        debug!(
            "bind `{}` at {} to {:?}",
            program.object(obj).name,
            program.display_pos(program.pos(target)),
            ctx
        );
        env.bind(obj, ctx);
        Ok(())
    }
}
